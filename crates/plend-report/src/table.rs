//! Result tables: a heading, column titles, formatted rows and footnotes.
//!
//! Builders turn analysis results into display strings once, so every
//! renderer (docx, terminal) shows the same numbers.

use plend_stats::{
    CorrelationMatrix, Descriptive, EffectRow, FactorSuitability, GroupComparison, GroupTest,
    MediationSummary, RegressionSummary, Reliability,
};

use crate::error::ReportError;

/// A rendered result table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportTable {
    pub heading: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// Lines printed below the table (fit statistics, sample sizes).
    pub notes: Vec<String>,
}

impl ReportTable {
    pub fn new(heading: impl Into<String>, columns: &[&str]) -> Self {
        Self {
            heading: heading.into(),
            columns: columns.iter().map(ToString::to_string).collect(),
            rows: Vec::new(),
            notes: Vec::new(),
        }
    }

    /// Append a row, padding or truncating it to the column count.
    pub fn push_row(&mut self, mut cells: Vec<String>) {
        cells.resize(self.columns.len(), String::new());
        self.rows.push(cells);
    }

    pub fn push_note(&mut self, note: impl Into<String>) {
        self.notes.push(note.into());
    }

    #[must_use]
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.push_note(note);
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Fail with [`ReportError::EmptyTable`] when there is nothing to render.
    pub fn ensure_rows(&self) -> Result<(), ReportError> {
        if self.is_empty() {
            return Err(ReportError::EmptyTable(self.heading.clone()));
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Builders
    // -----------------------------------------------------------------------

    /// Effect rows as returned by extraction or the summary table.
    pub fn from_effects(heading: impl Into<String>, effects: &[EffectRow], decimals: usize) -> Self {
        let mut table = Self::new(
            heading,
            &["Effect", "Estimate", "SE", "z", "p", "CI lower", "CI upper", "Std. all"],
        );
        for e in effects {
            table.push_row(vec![
                e.name.clone(),
                fmt_num(e.estimate, decimals),
                fmt_num(e.std_error, decimals),
                fmt_num(e.z_value, decimals),
                fmt_p(e.p_value, decimals),
                fmt_num(e.ci_lower, decimals),
                fmt_num(e.ci_upper, decimals),
                fmt_num(e.std_all, decimals),
            ]);
        }
        table
    }

    /// Mediation effects with the sample, bootstrap and fit notes.
    pub fn from_mediation(
        heading: impl Into<String>,
        summary: &MediationSummary,
        effects: &[EffectRow],
        decimals: usize,
    ) -> Self {
        let mut table = Self::from_effects(heading, effects, decimals);
        let [m1, m2] = &summary.mediators;
        table.push_note(format!(
            "Model: {} -> {{{m1}, {m2}}} -> {}; n = {} ({} excluded)",
            summary.independent, summary.dependent, summary.n, summary.excluded
        ));
        table.push_note(format!(
            "Bootstrap: {} resamples, seed {}, {} failed; {:.0}% percentile intervals",
            summary.resamples,
            summary.seed,
            summary.failed_resamples,
            summary.confidence * 100.0
        ));
        if let Some(p) = summary.fit_p_value {
            table.push_note(format!(
                "Chi-square({}) = {}, p = {}",
                summary.degrees_of_freedom,
                fmt_num(summary.chi_square, decimals),
                fmt_p(p, decimals)
            ));
        }
        table
    }

    pub fn from_regression(
        heading: impl Into<String>,
        summary: &RegressionSummary,
        decimals: usize,
    ) -> Self {
        let mut table = Self::new(
            heading,
            &["Term", "Estimate", "SE", "t", "p", "CI lower", "CI upper"],
        );
        for c in &summary.coefficients {
            table.push_row(vec![
                c.term.clone(),
                fmt_num(c.estimate, decimals),
                fmt_num(c.std_error, decimals),
                fmt_num(c.t_value, decimals),
                fmt_p(c.p_value, decimals),
                fmt_num(c.ci_lower, decimals),
                fmt_num(c.ci_upper, decimals),
            ]);
        }
        table.push_note(format!(
            "Dependent: {}; n = {} ({} excluded)",
            summary.dependent, summary.n, summary.excluded
        ));
        table.push_note(format!(
            "R2 = {}, adjusted R2 = {}, F({}, {}) = {}, p = {}",
            fmt_num(summary.r_squared, decimals),
            fmt_num(summary.adj_r_squared, decimals),
            summary.df_model,
            summary.df_residual,
            fmt_num(summary.f_statistic, decimals),
            fmt_p(summary.f_p_value, decimals)
        ));
        table.push_note(format!(
            "Sigma = {}, log-likelihood = {}, AIC = {}, BIC = {}",
            fmt_num(summary.sigma, decimals),
            fmt_num(summary.log_likelihood, decimals),
            fmt_num(summary.aic, decimals),
            fmt_num(summary.bic, decimals)
        ));
        table
    }

    pub fn from_comparison(
        heading: impl Into<String>,
        comparison: &GroupComparison,
        decimals: usize,
    ) -> Self {
        let mut table = Self::new(heading, &["Group", "n", "Mean", "SD"]);
        for g in &comparison.groups {
            table.push_row(vec![
                g.label.clone(),
                g.n.to_string(),
                fmt_num(g.mean, decimals),
                fmt_num(g.sd, decimals),
            ]);
        }
        table.push_note(format!(
            "{} by {} ({} grouping, {} excluded)",
            comparison.value_variable,
            comparison.group_variable,
            comparison.strategy,
            comparison.excluded
        ));
        let statistic = match &comparison.test {
            GroupTest::Welch(w) => format!(
                "{}: t({}) = {}, p = {}, mean difference = {}, d = {}",
                comparison.test.name(),
                fmt_num(w.df, decimals),
                fmt_num(w.t, decimals),
                fmt_p(w.p_value, decimals),
                fmt_num(w.mean_difference, decimals),
                fmt_num(w.cohens_d, decimals)
            ),
            GroupTest::Anova(a) => format!(
                "{}: F({}, {}) = {}, p = {}, eta2 = {}",
                comparison.test.name(),
                a.df_between,
                a.df_within,
                fmt_num(a.f, decimals),
                fmt_p(a.p_value, decimals),
                fmt_num(a.eta_squared, decimals)
            ),
        };
        table.push_note(statistic);
        table
    }

    pub fn from_suitability(
        heading: impl Into<String>,
        suitability: &FactorSuitability,
        decimals: usize,
    ) -> Self {
        let mut table = Self::new(heading, &["Variable", "MSA"]);
        for m in &suitability.msa {
            table.push_row(vec![m.variable.clone(), fmt_num(m.msa, decimals)]);
        }
        table.push_note(format!(
            "Overall KMO = {} ({})",
            fmt_num(suitability.kmo, decimals),
            suitability.band
        ));
        table.push_note(format!(
            "Bartlett's test: chi-square({}) = {}, p = {}, n = {}",
            suitability.bartlett.df,
            fmt_num(suitability.bartlett.chi_square, decimals),
            fmt_p(suitability.bartlett.p_value, decimals),
            suitability.n
        ));
        table
    }

    /// Lower-triangular correlation table with significance markers.
    pub fn from_correlation(
        heading: impl Into<String>,
        matrix: &CorrelationMatrix,
        decimals: usize,
    ) -> Self {
        let mut columns = vec!["Variable"];
        columns.extend(matrix.variables.iter().map(String::as_str));
        let mut table = Self::new(heading, &columns);
        for (i, name) in matrix.variables.iter().enumerate() {
            let mut cells = vec![name.clone()];
            for j in 0..matrix.variables.len() {
                cells.push(match j.cmp(&i) {
                    std::cmp::Ordering::Less => format!(
                        "{}{}",
                        fmt_num(matrix.r[i][j], decimals),
                        stars(matrix.p_values[i][j])
                    ),
                    std::cmp::Ordering::Equal => "1".to_string(),
                    std::cmp::Ordering::Greater => String::new(),
                });
            }
            table.push_row(cells);
        }
        let p = matrix.variables.len();
        let counts = (0..p).flat_map(|i| (0..i).map(move |j| (i, j)));
        let (lo, hi) = counts.fold((usize::MAX, 0), |(lo, hi), (i, j)| {
            (lo.min(matrix.n[i][j]), hi.max(matrix.n[i][j]))
        });
        if lo <= hi {
            table.push_note(format!("Pairwise-complete n: {lo} to {hi}"));
        }
        table.push_note("* p < .05, ** p < .01, *** p < .001");
        table
    }

    pub fn from_descriptives(
        heading: impl Into<String>,
        rows: &[Descriptive],
        decimals: usize,
    ) -> Self {
        let mut table = Self::new(
            heading,
            &[
                "Variable", "n", "Missing", "Mean", "SD", "Min", "Q1", "Median", "Q3", "Max",
                "Skewness", "Kurtosis",
            ],
        );
        for d in rows {
            table.push_row(vec![
                d.variable.clone(),
                d.n.to_string(),
                d.missing.to_string(),
                fmt_num(d.mean, decimals),
                fmt_num(d.sd, decimals),
                fmt_num(d.min, decimals),
                fmt_num(d.q1, decimals),
                fmt_num(d.median, decimals),
                fmt_num(d.q3, decimals),
                fmt_num(d.max, decimals),
                fmt_num(d.skewness, decimals),
                fmt_num(d.kurtosis, decimals),
            ]);
        }
        table
    }

    pub fn from_reliability(
        heading: impl Into<String>,
        rows: &[Reliability],
        decimals: usize,
    ) -> Self {
        let mut table = Self::new(heading, &["Composite", "Items", "n", "Cronbach's alpha"]);
        for r in rows {
            table.push_row(vec![
                r.composite.clone(),
                r.items.to_string(),
                r.n.to_string(),
                fmt_num(r.cronbach_alpha, decimals),
            ]);
        }
        table
    }
}

// ---------------------------------------------------------------------------
// Number formatting
// ---------------------------------------------------------------------------

/// Fixed-decimal number; `NA` for undefined values.
#[must_use]
pub fn fmt_num(value: f64, decimals: usize) -> String {
    if value.is_nan() {
        return "NA".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Inf" } else { "-Inf" }.to_string();
    }
    let text = format!("{value:.decimals$}");
    // "-0.000" reads as a sign error in a table
    if text.starts_with('-') && text[1..].chars().all(|c| c == '0' || c == '.') {
        text[1..].to_string()
    } else {
        text
    }
}

/// p-value with the smallest representable value shown as `< 0.001`.
#[must_use]
pub fn fmt_p(p: f64, decimals: usize) -> String {
    let floor = 10f64.powi(-i32::try_from(decimals).unwrap_or(i32::MAX));
    if p.is_finite() && p < floor {
        format!("< {floor:.decimals$}")
    } else {
        fmt_num(p, decimals)
    }
}

fn stars(p: f64) -> &'static str {
    match p {
        p if p < 0.001 => "***",
        p if p < 0.01 => "**",
        p if p < 0.05 => "*",
        _ => "",
    }
}
