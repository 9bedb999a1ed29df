//! Market data access port trait.

use crate::domain::error::EmatrailError;
use crate::domain::ohlcv::PriceSeries;
use chrono::NaiveDate;

pub trait DataPort {
    /// Bars for `symbol` within the optional inclusive date window.
    ///
    /// Fails with `NoData` when nothing is available.
    fn fetch_ohlcv(
        &self,
        symbol: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<PriceSeries, EmatrailError>;

    fn list_symbols(&self) -> Result<Vec<String>, EmatrailError>;

    fn get_data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, EmatrailError>;
}
