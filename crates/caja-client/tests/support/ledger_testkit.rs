#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use caja_client::ClientResult;
use caja_client::SuccessEnvelope;
use caja_client::commands::import::{self, ImportRunOptions};
use caja_client::commands::movement::{self, MovementCreateOptions, MovementInput};
use caja_client::commands::rate::{self, RateSetOptions};
use serde_json::Value;
use tempfile::{Builder, TempDir};

pub fn temp_home(prefix: &str) -> std::io::Result<(TempDir, PathBuf)> {
    let dir = Builder::new().prefix(prefix).tempdir()?;
    let home = dir.path().join("ledger-home");
    fs::create_dir_all(&home)?;
    Ok((dir, home))
}

pub fn envelope_json(result: ClientResult<SuccessEnvelope>) -> Value {
    assert!(result.is_ok());
    if let Ok(success) = result {
        let payload = serde_json::to_value(success);
        assert!(payload.is_ok());
        if let Ok(value) = payload {
            return value;
        }
    }
    Value::Null
}

pub fn import_json(home: &Path, records: &Value) -> Value {
    envelope_json(import::run_with_options(ImportRunOptions {
        path: Some("-".to_string()),
        dry_run: false,
        home_override: Some(home),
        stdin_override: Some(records.to_string()),
    }))
}

pub fn record_rate(home: &Path, buy: &str, sell: &str) {
    let result = rate::set_with_options(RateSetOptions {
        buy: buy.to_string(),
        sell: sell.to_string(),
        source: None,
        home_override: Some(home),
    });
    assert!(result.is_ok());
}

pub fn create_movement(home: &Path, input: MovementInput) -> Value {
    envelope_json(movement::create_with_options(MovementCreateOptions {
        input,
        home_override: Some(home),
    }))
}

pub fn input(
    kind: &str,
    payment_method: &str,
    currency: &str,
    amount: &str,
    expected_date: &str,
    effective_date: Option<&str>,
) -> MovementInput {
    MovementInput {
        kind: Some(kind.to_string()),
        payment_method: Some(payment_method.to_string()),
        currency: Some(currency.to_string()),
        amount: Some(amount.to_string()),
        expected_date: Some(expected_date.to_string()),
        effective_date: effective_date.map(str::to_string),
        ..MovementInput::default()
    }
}
