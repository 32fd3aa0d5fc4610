use colored::*;
use eyre::Result;
use std::path::Path;

use crate::cli::UserAction;
use crate::session;

pub fn run(action: UserAction, explicit: Option<&str>, state_dir: &Path) -> Result<()> {
    match action {
        UserAction::Show => {
            let user_id = session::persisted_user_id(explicit, state_dir)?;
            println!("{}", user_id);
        }
        UserAction::Set { id } => {
            let id = id.trim();
            if id.is_empty() {
                eyre::bail!("User id must not be empty");
            }
            session::store_user_id(state_dir, id)?;
            println!("{} User id set to {}", "✓".green(), id.cyan());
        }
    }
    Ok(())
}
