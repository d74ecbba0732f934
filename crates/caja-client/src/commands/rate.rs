use std::path::Path;

use crate::commands::common::{load_setup, open_reader, open_writer, stored_rate_data};
use crate::contracts::envelope::{SuccessEnvelope, success};
use crate::contracts::types::RateShowData;
use crate::store::validate::validate_rate;
use crate::store::{now_timestamp, rates};
use crate::{ClientError, ClientResult};

const HISTORY_LIMIT: i64 = 20;

#[derive(Debug, Default)]
pub struct RateSetOptions<'a> {
    pub buy: String,
    pub sell: String,
    pub source: Option<String>,
    pub home_override: Option<&'a Path>,
}

#[derive(Debug, Default)]
pub struct RateShowOptions<'a> {
    pub home_override: Option<&'a Path>,
}

pub fn set(buy: String, sell: String, source: Option<String>) -> ClientResult<SuccessEnvelope> {
    set_with_options(RateSetOptions {
        buy,
        sell,
        source,
        home_override: None,
    })
}

/// Records a new buy/sell quote. The latest recorded quote is the one read
/// views use unless a command overrides it.
#[doc(hidden)]
pub fn set_with_options(options: RateSetOptions<'_>) -> ClientResult<SuccessEnvelope> {
    let rate = validate_rate(&options.buy, &options.sell)?;
    let source = options
        .source
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty());

    let setup = load_setup(options.home_override)?;
    let (connection, db_path) = open_writer(&setup)?;
    rates::insert(&connection, &db_path, &rate, source, &now_timestamp())?;
    let stored = rates::latest(&connection, &db_path)?
        .ok_or_else(ClientError::exchange_rate_not_set)?;

    success("rate set", stored_rate_data(stored))
}

pub fn show() -> ClientResult<SuccessEnvelope> {
    show_with_options(RateShowOptions {
        home_override: None,
    })
}

#[doc(hidden)]
pub fn show_with_options(options: RateShowOptions<'_>) -> ClientResult<SuccessEnvelope> {
    let setup = load_setup(options.home_override)?;
    let (connection, db_path) = open_reader(&setup)?;
    let mut history = rates::history(&connection, &db_path, HISTORY_LIMIT)?
        .into_iter()
        .map(stored_rate_data)
        .collect::<Vec<_>>();
    if history.is_empty() {
        return Err(ClientError::exchange_rate_not_set());
    }
    let current = history.remove(0);

    success("rate show", RateShowData { current, history })
}
