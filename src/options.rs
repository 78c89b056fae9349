use chrono::NaiveDate;

use super::filings::DetailedFiling;

/// Options for filtering filing requests
#[derive(Debug, Clone, Default)]
pub struct FilingOptions {
    pub form_types: Option<Vec<String>>,
    /// Earliest filing date, inclusive
    pub from_date: Option<NaiveDate>,
    /// Latest filing date, inclusive
    pub to_date: Option<NaiveDate>,
    pub offset: Option<usize>,
    pub limit: Option<usize>,
    /// Whether to also admit amendment forms (e.g. 10-K/A when 10-K is requested).
    /// Defaults to false: form types match exactly.
    pub include_amendments: bool,
}

impl FilingOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_form_type(mut self, form_type: impl Into<String>) -> Self {
        let form_type = form_type.into();
        self.form_types = Some(vec![form_type]);
        self
    }

    pub fn with_form_types(mut self, form_types: Vec<String>) -> Self {
        self.form_types = Some(form_types);
        self
    }

    pub fn with_from_date(mut self, from: NaiveDate) -> Self {
        self.from_date = Some(from);
        self
    }

    pub fn with_to_date(mut self, to: NaiveDate) -> Self {
        self.to_date = Some(to);
        self
    }

    /// Restricts results to filings dated within `[from, to]`, both ends included.
    pub fn with_date_range(self, from: NaiveDate, to: NaiveDate) -> Self {
        self.with_from_date(from).with_to_date(to)
    }

    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Set whether to include amendment forms automatically.
    ///
    /// When true, requesting "S-1" will also include "S-1/A" filings.
    /// When false (default), only the exact form type specified will be returned.
    pub fn with_include_amendments(mut self, include_amendments: bool) -> Self {
        self.include_amendments = include_amendments;
        self
    }

    /// Whether a single filing passes the form-type and date filters.
    pub fn matches(&self, filing: &DetailedFiling) -> bool {
        let form = filing.form.trim();

        if let Some(form_types) = &self.form_types {
            let wanted = form_types.iter().any(|ft| {
                let ft = ft.trim();
                form == ft
                    || (self.include_amendments
                        && form
                            .strip_suffix("/A")
                            .is_some_and(|base| base == ft))
            });
            if !wanted {
                return false;
            }
        }

        if self.from_date.is_some_and(|from| filing.filing_date < from) {
            return false;
        }
        if self.to_date.is_some_and(|to| filing.filing_date > to) {
            return false;
        }
        true
    }

    /// Filters `filings` and then applies offset and limit.
    pub fn apply(&self, filings: Vec<DetailedFiling>) -> Vec<DetailedFiling> {
        filings
            .into_iter()
            .filter(|filing| self.matches(filing))
            .skip(self.offset.unwrap_or(0))
            .take(self.limit.unwrap_or(usize::MAX))
            .collect()
    }
}
