//! abtext-core - Text-length A/B simulation for crowdfunding projects
//!
//! This crate runs a one-shot experiment over a snapshot of project
//! records: it derives text lengths, splits the projects into a control
//! group and minimum-essay-length treatment groups, simulates how each
//! rule would shift approvals, and reports the outcome with significance
//! tests and a funding estimate.
//!
//! # Stages
//!
//! 1. **Dataset**: load records and derive `TextFeatures`
//! 2. **Descriptive**: text length statistics by approval status
//! 3. **Design**: sample sizes needed for candidate effect sizes
//! 4. **Assignment**: seeded partition into groups plus outcome simulation
//! 5. **Results**: per-group approval rates, affected projects, essay bins
//! 6. **Significance**: each treatment against the control
//! 7. **Impact**: annual approvals and funding implied by each rate change
//! 8. **Recommendations**: best and worst treatment, adoption advice
//!
//! `pipeline::run` executes the stages in order and returns an
//! `AnalysisReport`.

pub mod assignment;
pub mod charts;
pub mod config;
pub mod dataset;
pub mod descriptive;
pub mod design;
pub mod error;
pub mod impact;
pub mod pipeline;
pub mod recommend;
pub mod report;
pub mod results;
pub mod significance;

pub use assignment::{assign_groups, Assignment, AssignmentSummary};
pub use config::*;
pub use dataset::{text_length, Project, ProjectTable, TextFeatures};
pub use descriptive::{describe, DescriptiveSummary};
pub use design::{sample_size_plan, SampleSizePlan};
pub use error::{AbTestError, Result};
pub use impact::{business_impact, BusinessImpact, ImpactSummary};
pub use pipeline::{run, run_file};
pub use recommend::{recommend, Recommendations};
pub use report::AnalysisReport;
pub use results::{analyze_results, ExperimentResults};
pub use significance::{test_treatments, SignificanceSummary};
