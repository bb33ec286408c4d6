//! Plot views and their registry.
//!
//! Every view is keyed by a name derived from its kind and keys; the
//! registry holds at most one view per name. Views cache the figure data
//! computed from the dataset and are re-rendered after each mutation.

use mooda_core::{
    qc_key, AverageTime, Error, FlagSeries, Histogram, QcBar, Result, ScatterMatrix, Series,
    Spectrogram, WaterFrame,
};

/// Number of bins of histogram views.
pub const HISTOGRAM_BINS: usize = 20;

/// Name of the QC bar view.
pub const QC_BAR_NAME: &str = "QC";

/// Name of the spectrogram view.
pub const SPECTROGRAM_NAME: &str = "Spectrogram";

/// What a view shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlotKind {
    /// One or more parameters against time.
    TimeSeries { keys: Vec<String> },
    Histogram { keys: Vec<String> },
    /// Observations of one parameter colored by QC flag.
    Flags { parameter: String },
    /// Flag counts of every parameter.
    QcBar,
    ScatterMatrix { keys: Vec<String> },
    Spectrogram,
}

impl PlotKind {
    /// Registry name of the view.
    #[must_use]
    pub fn name(&self) -> String {
        match self {
            PlotKind::TimeSeries { keys } => keys.join("_"),
            PlotKind::Histogram { keys } => format!("hist_{}", keys.join("_")),
            PlotKind::Flags { parameter } => qc_key(parameter),
            PlotKind::QcBar => QC_BAR_NAME.to_string(),
            PlotKind::ScatterMatrix { keys } => format!("scatter_{}", keys.join("_")),
            PlotKind::Spectrogram => SPECTROGRAM_NAME.to_string(),
        }
    }

    /// Dataset keys the view depends on. Empty for dataset-wide views.
    #[must_use]
    pub fn keys(&self) -> &[String] {
        match self {
            PlotKind::TimeSeries { keys }
            | PlotKind::Histogram { keys }
            | PlotKind::ScatterMatrix { keys } => keys,
            PlotKind::Flags { parameter } => std::slice::from_ref(parameter),
            PlotKind::QcBar | PlotKind::Spectrogram => &[],
        }
    }

    fn rename_key(&mut self, old: &str, new: &str) -> bool {
        let mut renamed = false;
        match self {
            PlotKind::TimeSeries { keys }
            | PlotKind::Histogram { keys }
            | PlotKind::ScatterMatrix { keys } => {
                for key in keys.iter_mut().filter(|k| k.as_str() == old) {
                    *key = new.to_string();
                    renamed = true;
                }
            }
            PlotKind::Flags { parameter } => {
                if parameter == old {
                    *parameter = new.to_string();
                    renamed = true;
                }
            }
            PlotKind::QcBar | PlotKind::Spectrogram => {}
        }
        renamed
    }

    /// True for views showing QC flags.
    #[must_use]
    pub fn shows_flags(&self) -> bool {
        matches!(self, PlotKind::Flags { .. } | PlotKind::QcBar)
    }
}

/// Figure data of a view.
#[derive(Debug, Clone, PartialEq)]
pub enum Figure {
    TimeSeries(Vec<Series>),
    Histogram(Vec<Histogram>),
    Flags(FlagSeries),
    QcBar(Vec<QcBar>),
    ScatterMatrix(ScatterMatrix),
    Spectrogram(Spectrogram),
}

/// Toolbar settings of time-series views.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TimeSeriesOptions {
    /// Moving window in points (0 = off).
    pub rolling: usize,
    pub average: AverageTime,
    /// Key drawn against the right axis.
    pub secondary: Option<String>,
}

/// One open plot.
#[derive(Debug, Clone)]
pub struct PlotView {
    name: String,
    kind: PlotKind,
    /// Whether the window is shown.
    pub visible: bool,
    pub options: TimeSeriesOptions,
    figure: Figure,
}

impl PlotView {
    /// Creates a view and renders it once.
    ///
    /// Time-series views start with an average picked from the data.
    ///
    /// # Errors
    /// Returns the dataset error if the figure cannot be built.
    pub fn new(kind: PlotKind, frame: &WaterFrame) -> Result<Self> {
        let mut options = TimeSeriesOptions::default();
        if let PlotKind::TimeSeries { keys } = &kind {
            options.average = frame.auto_average(keys)?;
        }
        let figure = render(&kind, &options, frame)?;
        Ok(Self {
            name: kind.name(),
            kind,
            visible: true,
            options,
            figure,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &PlotKind {
        &self.kind
    }

    pub fn figure(&self) -> &Figure {
        &self.figure
    }

    /// Rebuilds the figure from `frame`. The previous figure is kept on error.
    ///
    /// # Errors
    /// Returns the dataset error if the figure cannot be built.
    pub fn refresh(&mut self, frame: &WaterFrame) -> Result<()> {
        if self
            .options
            .secondary
            .as_ref()
            .is_some_and(|key| !self.kind.keys().contains(key))
        {
            self.options.secondary = None;
        }
        self.figure = render(&self.kind, &self.options, frame)?;
        Ok(())
    }
}

fn render(kind: &PlotKind, options: &TimeSeriesOptions, frame: &WaterFrame) -> Result<Figure> {
    Ok(match kind {
        PlotKind::TimeSeries { keys } => {
            Figure::TimeSeries(frame.tsplot(keys, options.rolling, options.average)?)
        }
        PlotKind::Histogram { keys } => Figure::Histogram(frame.hist(keys, HISTOGRAM_BINS)?),
        PlotKind::Flags { parameter } => Figure::Flags(frame.qcplot(parameter)?),
        PlotKind::QcBar => Figure::QcBar(frame.qcbarplot()),
        PlotKind::ScatterMatrix { keys } => Figure::ScatterMatrix(frame.scatter_matrix(keys)?),
        PlotKind::Spectrogram => Figure::Spectrogram(frame.spectrogram()?),
    })
}

/// True for errors meaning the view points at data that no longer exists.
#[must_use]
pub fn is_stale(error: &Error) -> bool {
    matches!(error, Error::KeyNotFound(_) | Error::NoAcousticData)
}

/// Open plot views, at most one per name.
#[derive(Debug, Default)]
pub struct PlotRegistry {
    views: Vec<PlotView>,
}

impl PlotRegistry {
    pub fn views(&self) -> &[PlotView] {
        &self.views
    }

    pub fn views_mut(&mut self) -> &mut [PlotView] {
        &mut self.views
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&PlotView> {
        self.views.iter().find(|v| v.name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut PlotView> {
        self.views.iter_mut().find(|v| v.name == name)
    }

    /// Shows the view of `kind`, reusing an existing one with the same
    /// name. A reused view is made visible and refreshed; a stale one is
    /// removed.
    ///
    /// # Errors
    /// Returns the dataset error if the figure cannot be built.
    pub fn show(&mut self, kind: PlotKind, frame: &WaterFrame) -> Result<()> {
        let name = kind.name();
        if let Some(position) = self.views.iter().position(|v| v.name == name) {
            let view = &mut self.views[position];
            match view.refresh(frame) {
                Ok(()) => {
                    view.visible = true;
                    Ok(())
                }
                Err(e) => {
                    if is_stale(&e) {
                        self.views.remove(position);
                    }
                    Err(e)
                }
            }
        } else {
            self.views.push(PlotView::new(kind, frame)?);
            Ok(())
        }
    }

    /// Removes a view. Returns true if it existed.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.views.len();
        self.views.retain(|v| v.name != name);
        self.views.len() != before
    }

    pub fn clear(&mut self) {
        self.views.clear();
    }

    /// Re-renders every view; stale views are dropped. Returns the names of
    /// the dropped views.
    pub fn refresh_all(&mut self, frame: &WaterFrame) -> Vec<String> {
        self.refresh_where(frame, |_| true)
    }

    /// Re-renders the views showing QC flags and makes the QC bar view
    /// visible, creating it if needed. Returns the names of dropped views.
    pub fn refresh_flags(&mut self, frame: &WaterFrame) -> Vec<String> {
        let removed = self.refresh_where(frame, |view| view.kind.shows_flags());
        if let Some(view) = self.get_mut(QC_BAR_NAME) {
            view.visible = true;
        } else if let Ok(view) = PlotView::new(PlotKind::QcBar, frame) {
            self.views.push(view);
        }
        removed
    }

    fn refresh_where<F>(&mut self, frame: &WaterFrame, filter: F) -> Vec<String>
    where
        F: Fn(&PlotView) -> bool,
    {
        let mut removed = Vec::new();
        self.views.retain_mut(|view| {
            if !filter(view) {
                return true;
            }
            match view.refresh(frame) {
                Ok(()) => true,
                Err(e) if is_stale(&e) => {
                    removed.push(view.name.clone());
                    false
                }
                Err(e) => {
                    log::warn!("Plot {} not refreshed: {e}", view.name);
                    true
                }
            }
        });
        removed
    }

    /// Follows a parameter rename: views keyed on `old` are re-keyed and
    /// renamed in place, then every view is re-rendered. Returns the names
    /// of dropped views.
    pub fn rename_key(&mut self, old: &str, new: &str, frame: &WaterFrame) -> Vec<String> {
        for view in &mut self.views {
            if view.kind.rename_key(old, new) {
                view.name = view.kind.name();
                if view.options.secondary.as_deref() == Some(old) {
                    view.options.secondary = Some(new.to_string());
                }
            }
        }
        // A renamed view may now collide with an existing one.
        let mut seen = Vec::new();
        self.views.retain(|v| {
            if seen.contains(&v.name) {
                false
            } else {
                seen.push(v.name.clone());
                true
            }
        });
        self.refresh_all(frame)
    }
}

/// Maps `points` linearly from the `from` value range onto `to`, for
/// drawing a secondary-axis series in primary-axis coordinates.
#[must_use]
pub fn rescale(points: &[[f64; 2]], from: (f64, f64), to: (f64, f64)) -> Vec<[f64; 2]> {
    let span = from.1 - from.0;
    points
        .iter()
        .map(|[x, y]| {
            let t = if span.abs() > f64::EPSILON {
                (y - from.0) / span
            } else {
                0.5
            };
            [*x, to.0 + t * (to.1 - to.0)]
        })
        .collect()
}

/// Finite minimum and maximum of the y values.
#[must_use]
pub fn value_range(points: &[[f64; 2]]) -> Option<(f64, f64)> {
    points
        .iter()
        .map(|p| p[1])
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}
