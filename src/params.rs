use url::Url;

/// Format of account snapshots and blueprint image exports when none is given.
pub const DEFAULT_SNAPSHOT_FORMAT: &str = "png";
/// Format of blueprint budget exports when none is given.
pub const DEFAULT_BUDGET_FORMAT: &str = "csv";

/// Default width, in pixels, of snapshots and image exports.
pub const DEFAULT_IMAGE_WIDTH: u32 = 1920;
/// Default height, in pixels, of snapshots and image exports.
pub const DEFAULT_IMAGE_HEIGHT: u32 = 1080;

/// Rendering options for an AWS or Azure account snapshot.
///
/// Fields left at their zero value are omitted from the query string.
#[derive(Clone, Debug, PartialEq)]
pub struct SnapshotParams {
    pub paper_size: Option<String>,
    pub projection: Option<String>,
    pub theme: Option<String>,
    /// Resource filters, joined with `,`.
    pub filter: Vec<String>,
    /// Resource types to exclude, joined with `,`.
    pub exclude: Vec<String>,
    pub label: bool,
    pub autoconnect: bool,
    pub grid: bool,
    pub transparent: bool,
    pub landscape: bool,
    pub scale: f32,
    pub width: u32,
    pub height: u32,
}

impl Default for SnapshotParams {
    fn default() -> Self {
        Self {
            paper_size: None,
            projection: None,
            theme: None,
            filter: Vec::new(),
            exclude: Vec::new(),
            label: false,
            autoconnect: false,
            grid: false,
            transparent: false,
            landscape: false,
            scale: 0.0,
            width: DEFAULT_IMAGE_WIDTH,
            height: DEFAULT_IMAGE_HEIGHT,
        }
    }
}

impl SnapshotParams {
    pub(crate) fn query(&self) -> Query {
        let mut query = Query::default();
        query.text("paperSize", self.paper_size.as_deref());
        query.text("projection", self.projection.as_deref());
        query.text("theme", self.theme.as_deref());
        query.list("filter", &self.filter);
        query.list("exclude", &self.exclude);
        query.flag("label", self.label);
        query.flag("autoconnect", self.autoconnect);
        query.flag("grid", self.grid);
        query.flag("transparent", self.transparent);
        query.flag("landscape", self.landscape);
        query.scale(self.scale);
        query.number("width", self.width);
        query.number("height", self.height);
        query
    }
}

/// Rendering options for a blueprint image export.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageExportParams {
    pub paper_size: Option<String>,
    pub grid: bool,
    pub transparent: bool,
    pub landscape: bool,
    pub scale: f32,
    pub width: u32,
    pub height: u32,
}

impl Default for ImageExportParams {
    fn default() -> Self {
        Self {
            paper_size: None,
            grid: false,
            transparent: false,
            landscape: false,
            scale: 0.0,
            width: DEFAULT_IMAGE_WIDTH,
            height: DEFAULT_IMAGE_HEIGHT,
        }
    }
}

impl ImageExportParams {
    pub(crate) fn query(&self) -> Query {
        let mut query = Query::default();
        query.text("paperSize", self.paper_size.as_deref());
        query.flag("grid", self.grid);
        query.flag("transparent", self.transparent);
        query.flag("landscape", self.landscape);
        query.scale(self.scale);
        query.number("width", self.width);
        query.number("height", self.height);
        query
    }
}

/// Options for a blueprint budget export.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BudgetExportParams {
    /// ISO 4217 currency code.
    pub currency: Option<String>,
    /// Billing period: `hr`, `day`, `wk`, `m` or `yr`.
    pub period: Option<String>,
    /// Pricing rate, e.g. `ondemand` or `reserved`.
    pub rate: Option<String>,
}

impl Default for BudgetExportParams {
    fn default() -> Self {
        Self {
            currency: Some("USD".to_owned()),
            period: Some("m".to_owned()),
            rate: None,
        }
    }
}

impl BudgetExportParams {
    pub(crate) fn query(&self) -> Query {
        let mut query = Query::default();
        query.text("currency", self.currency.as_deref());
        query.text("period", self.period.as_deref());
        query.text("rate", self.rate.as_deref());
        query
    }
}

/// Query-string builder that skips unset values and encodes keys in sorted
/// order.
#[derive(Debug, Default)]
pub(crate) struct Query {
    pairs: Vec<(&'static str, String)>,
}

impl Query {
    fn text(&mut self, key: &'static str, value: Option<&str>) {
        if let Some(value) = value.filter(|value| !value.is_empty()) {
            self.pairs.push((key, value.to_owned()));
        }
    }

    fn list(&mut self, key: &'static str, values: &[String]) {
        if !values.is_empty() {
            self.pairs.push((key, values.join(",")));
        }
    }

    fn flag(&mut self, key: &'static str, value: bool) {
        if value {
            self.pairs.push((key, "true".to_owned()));
        }
    }

    fn number(&mut self, key: &'static str, value: u32) {
        if value != 0 {
            self.pairs.push((key, value.to_string()));
        }
    }

    fn scale(&mut self, value: f32) {
        if value != 0.0 && value.is_finite() {
            self.pairs.push(("scale", value.to_string()));
        }
    }

    /// Replaces the query of `url`; an empty builder clears it.
    pub(crate) fn apply(mut self, url: &mut Url) {
        if self.pairs.is_empty() {
            url.set_query(None);
            return;
        }
        self.pairs.sort_by_key(|(key, _)| *key);
        url.query_pairs_mut().clear().extend_pairs(self.pairs);
    }
}
