use caja_client::commands;
use caja_client::commands::common::RateInput;
use caja_client::commands::movement::{MovementInput, MovementListOptions, MovementPatch};
use caja_client::{ClientResult, SuccessEnvelope};

use crate::cli::{
    Cli, Commands, IsoDate, MovementCommand, MovementFieldArgs, RateCommand, RateOverrideArgs,
    ReportCommand,
};

pub fn dispatch(cli: &Cli) -> ClientResult<SuccessEnvelope> {
    match &cli.command {
        Commands::Movement { command } => dispatch_movement(command),
        Commands::Import { dry_run, path, .. } => commands::import::run(path.clone(), *dry_run),
        Commands::Summary { as_of, rate, .. } => {
            commands::summary::run(date_string(as_of.as_ref()), rate_input(rate))
        }
        Commands::Report { command } => match command {
            ReportCommand::Daily { date, rate, .. } => {
                commands::report::daily(date.as_str().to_string(), rate_input(rate))
            }
            ReportCommand::Monthly { month, rate, .. } => {
                commands::report::monthly(month.clone(), rate_input(rate))
            }
        },
        Commands::Rate { command } => match command {
            RateCommand::Set {
                buy, sell, source, ..
            } => commands::rate::set(buy.clone(), sell.clone(), source.clone()),
            RateCommand::Show { .. } => commands::rate::show(),
        },
    }
}

fn dispatch_movement(command: &MovementCommand) -> ClientResult<SuccessEnvelope> {
    match command {
        MovementCommand::Create { fields, .. } => {
            commands::movement::create(movement_input(fields))
        }
        MovementCommand::List {
            status,
            kind,
            currency,
            payment_method,
            category,
            date_field,
            from,
            to,
            sort,
            desc,
            page,
            per_page,
            ..
        } => commands::movement::list(MovementListOptions {
            status: status.clone(),
            kind: kind.clone(),
            currency: currency.clone(),
            payment_method: payment_method.clone(),
            category: category.clone(),
            date_field: date_field.clone(),
            from: date_string(from.as_ref()),
            to: date_string(to.as_ref()),
            sort: sort.clone(),
            descending: *desc,
            page: *page,
            per_page: *per_page,
            home_override: None,
        }),
        MovementCommand::Edit {
            movement_id,
            fields,
            clear_effective,
            ..
        } => commands::movement::edit(
            movement_id,
            MovementPatch {
                fields: movement_input(fields),
                clear_effective_date: *clear_effective,
            },
        ),
        MovementCommand::Settle {
            movement_id, on, ..
        } => commands::movement::settle(movement_id, date_string(on.as_ref())),
        MovementCommand::Delete { movement_id, .. } => commands::movement::delete(movement_id),
    }
}

fn movement_input(fields: &MovementFieldArgs) -> MovementInput {
    MovementInput {
        kind: fields.kind.clone(),
        payment_method: fields.payment_method.clone(),
        currency: fields.currency.clone(),
        amount: fields.amount.clone(),
        expected_date: fields.expected_date.clone(),
        effective_date: fields.effective_date.clone(),
        category: fields.category.clone(),
        subcategory: fields.subcategory.clone(),
        detail: fields.detail.clone(),
        client_ref: fields.client_ref.clone(),
        provider_ref: fields.provider_ref.clone(),
        event_ref: fields.event_ref.clone(),
        team_member_ref: fields.team_member_ref.clone(),
    }
}

fn rate_input(args: &RateOverrideArgs) -> Option<RateInput> {
    match (&args.rate_buy, &args.rate_sell) {
        (Some(buy), Some(sell)) => Some(RateInput {
            buy: buy.clone(),
            sell: sell.clone(),
        }),
        _ => None,
    }
}

fn date_string(value: Option<&IsoDate>) -> Option<String> {
    value.map(|date| date.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use crate::cli::parse_from;

    use super::{movement_input, rate_input};
    use crate::cli::{Commands, MovementCommand};

    #[test]
    fn rate_flags_become_override_input() {
        let parsed = parse_from([
            "caja",
            "summary",
            "--rate-buy",
            "950",
            "--rate-sell",
            "990",
        ]);
        assert!(parsed.is_ok());
        if let Ok(cli) = parsed
            && let Commands::Summary { rate, .. } = &cli.command
        {
            let input = rate_input(rate);
            assert!(input.is_some());
            if let Some(value) = input {
                assert_eq!(value.buy, "950");
                assert_eq!(value.sell, "990");
            }
        }
    }

    #[test]
    fn movement_flags_map_onto_input_fields() {
        let parsed = parse_from([
            "caja",
            "movement",
            "create",
            "--kind",
            "outflow",
            "--method",
            "wire_transfer",
            "--client",
            "Acme",
            "--member",
            "Ana",
        ]);
        assert!(parsed.is_ok());
        if let Ok(cli) = parsed
            && let Commands::Movement {
                command: MovementCommand::Create { fields, .. },
            } = &cli.command
        {
            let input = movement_input(fields);
            assert_eq!(input.kind.as_deref(), Some("outflow"));
            assert_eq!(input.payment_method.as_deref(), Some("wire_transfer"));
            assert_eq!(input.client_ref.as_deref(), Some("Acme"));
            assert_eq!(input.team_member_ref.as_deref(), Some("Ana"));
            assert!(input.amount.is_none());
        }
    }
}
