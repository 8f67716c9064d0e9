use comfy_table::{presets, Cell, CellAlignment, ContentArrangement, Table};

/// Diagnostics of one A-IHT iteration.
#[derive(Debug, Clone)]
pub struct IterationReport {
    pub iteration: usize,
    /// `||y - phi x_cur||` after the iteration.
    pub objective: f64,
    pub mu_bar: f64,
    pub tau: f64,
    /// `||x_cur - x_prev||`.
    pub step_norm: f64,
    /// Number of nonzero weights in x_cur.
    pub support_size: usize,
    /// The active subspace S_i the gradient step was sized on.
    pub candidate_support: Vec<usize>,
}

pub(crate) fn emit_line(line: &str) {
    if log::log_enabled!(log::Level::Info) {
        log::info!("{line}");
    } else {
        println!("{line}");
    }
}

pub trait Reporter {
    fn on_iteration(&mut self, report: &IterationReport);
    fn on_finish(&mut self) {}
}

/// Keeps every report, e.g. to plot convergence of the objective.
#[derive(Debug, Default)]
pub struct History {
    pub reports: Vec<IterationReport>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn objectives(&self) -> Vec<f64> {
        self.reports.iter().map(|r| r.objective).collect()
    }
}

impl Reporter for History {
    fn on_iteration(&mut self, report: &IterationReport) {
        self.reports.push(report.clone());
    }
}

/// Buffers the iterations and prints them as a table once the solve ends.
pub struct TableReporter {
    rows: Vec<IterationReport>,
}

impl TableReporter {
    pub fn new() -> Self {
        Self { rows: Vec::new() }
    }
}

impl Default for TableReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Reporter for TableReporter {
    fn on_iteration(&mut self, report: &IterationReport) {
        self.rows.push(report.clone());
    }

    fn on_finish(&mut self) {
        if self.rows.is_empty() {
            return;
        }
        let mut table = Table::new();
        table.load_preset(presets::UTF8_FULL);
        table.set_content_arrangement(ContentArrangement::Dynamic);
        table.set_header(vec![
            Cell::new("iter").set_alignment(CellAlignment::Right),
            Cell::new("objective").set_alignment(CellAlignment::Right),
            Cell::new("mu").set_alignment(CellAlignment::Right),
            Cell::new("tau").set_alignment(CellAlignment::Right),
            Cell::new("step").set_alignment(CellAlignment::Right),
            Cell::new("active").set_alignment(CellAlignment::Right),
            Cell::new("support").set_alignment(CellAlignment::Right),
        ]);
        for row in &self.rows {
            table.add_row(vec![
                Cell::new(row.iteration).set_alignment(CellAlignment::Right),
                Cell::new(format!("{:.4e}", row.objective)).set_alignment(CellAlignment::Right),
                Cell::new(format!("{:.3e}", row.mu_bar)).set_alignment(CellAlignment::Right),
                Cell::new(format!("{:.3}", row.tau)).set_alignment(CellAlignment::Right),
                Cell::new(format!("{:.1e}", row.step_norm)).set_alignment(CellAlignment::Right),
                Cell::new(row.candidate_support.len()).set_alignment(CellAlignment::Right),
                Cell::new(row.support_size).set_alignment(CellAlignment::Right),
            ]);
        }

        for line in table.to_string().lines() {
            emit_line(line);
        }
        self.rows.clear();
    }
}

pub(crate) enum ReporterSlot<'a> {
    External(&'a mut dyn Reporter),
    Local(TableReporter),
    None,
}

impl<'a> ReporterSlot<'a> {
    pub(crate) fn new(reporter: Option<&'a mut dyn Reporter>, verbose: bool) -> Self {
        match reporter {
            Some(r) => Self::External(r),
            None if verbose => Self::Local(TableReporter::new()),
            None => Self::None,
        }
    }

    pub(crate) fn as_mut(&mut self) -> Option<&mut dyn Reporter> {
        match self {
            Self::External(r) => Some(&mut **r),
            Self::Local(r) => Some(r),
            Self::None => None,
        }
    }
}
