use crate::cli::{Commands, MovementCommand, RateCommand, ReportCommand};

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum OutputMode {
    Text,
    Json,
}

pub fn mode_for_command(command: &Commands) -> OutputMode {
    let json = match command {
        Commands::Movement { command } => match command {
            MovementCommand::Create { json, .. }
            | MovementCommand::List { json, .. }
            | MovementCommand::Edit { json, .. }
            | MovementCommand::Settle { json, .. }
            | MovementCommand::Delete { json, .. } => *json,
        },
        Commands::Import { json, .. } | Commands::Summary { json, .. } => *json,
        Commands::Report { command } => match command {
            ReportCommand::Daily { json, .. } | ReportCommand::Monthly { json, .. } => *json,
        },
        Commands::Rate { command } => match command {
            RateCommand::Set { json, .. } | RateCommand::Show { json } => *json,
        },
    };

    if json {
        OutputMode::Json
    } else {
        OutputMode::Text
    }
}
