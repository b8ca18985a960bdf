use anyhow::Result;
use serde_json::json;

use crate::Context;
use crate::cli::LookupCommand;
use crate::progress;
use crate::ui;

use super::connect;

pub fn run(ctx: &Context, cmd: LookupCommand) -> Result<()> {
    match cmd {
        LookupCommand::ConnectionInfo {
            kasm_id,
            user_id,
            skip_agent_check,
            json,
        } => {
            let query = json!({
                "kasm_id": kasm_id,
                "user_id": user_id,
                "skip_agent_check": skip_agent_check,
            });
            let result = query_source(ctx, "connection_info", &query)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
                return Ok(());
            }

            ui::header(&format!("Session {kasm_id}"));
            if let Some(fields) = result.as_object() {
                for (key, value) in fields {
                    ui::kv(key, &ui::value(value));
                }
            }
            Ok(())
        }
    }
}

fn query_source(
    ctx: &Context,
    name: &str,
    query: &serde_json::Value,
) -> Result<serde_json::Value> {
    let registry = connect(ctx)?;
    let source = registry.data_source(name)?;

    let spinner = progress::spinner(&format!("Looking up {name}..."), ctx.quiet);
    let result = source.lookup(query, &ctx.cancel_token());
    spinner.finish_and_clear();

    Ok(result?)
}
