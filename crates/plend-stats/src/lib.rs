//! # plend-stats
//!
//! Analyses over a loaded [`plend_core::Dataset`]. Every entry point takes an
//! explicit [`AnalysisContext`] holding the dataset and the run settings.
//!
//! - Descriptive statistics and Cronbach's alpha
//! - Simple and multiple OLS regression with information criteria
//! - Pairwise-complete Pearson correlation matrices
//! - Welch t-test / one-way ANOVA with validated grouping
//! - KMO sampling adequacy and Bartlett's sphericity test
//! - Parallel two-mediator model with bootstrap inference
//!
//! Missing values never raise errors: each analysis excludes incomplete rows
//! pairwise or listwise and reports how many it dropped.

pub mod context;
pub mod correlation;
pub mod descriptive;
pub mod error;
pub mod factor;
pub mod groups;
pub mod math;
pub mod mediation;
pub mod regression;
pub mod reliability;

pub use context::{AnalysisContext, AnalysisSettings, BootstrapSettings, EstimationSettings};
pub use correlation::{CorrelationMatrix, correlate, correlation_matrix, pearson};
pub use descriptive::{Descriptive, describe, describe_values};
pub use error::StatsError;
pub use factor::{BartlettTest, FactorSuitability, KmoBand, VariableMsa, assess, bartlett, kmo};
pub use groups::{
    AnovaTest, GroupComparison, GroupSummary, GroupTest, GroupedValues, Grouping, WelchTest,
    assign_groups, compare_groups, group_values, one_way_anova, welch_t_test,
};
pub use mediation::{
    EffectRow, FittedMediation, MediationSpec, MediationSummary, fit_mediation,
    fit_mediation_with_progress,
};
pub use regression::{Coefficient, INTERCEPT, RegressionSummary, ols, regress, simple_regression};
pub use reliability::{Reliability, cronbach_alpha};
