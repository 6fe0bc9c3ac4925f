use std::sync::Arc;

use anyhow::Result;

use roam_core::EventBus;
use roam_core::feedback::FeedbackRepository;
use roam_db::KvStore;
use roam_db::models::Feedback;

use crate::FeedbackCommands;

pub async fn run_feedback_command(
    command: FeedbackCommands,
    store: Arc<dyn KvStore>,
    events: EventBus,
) -> Result<()> {
    let repo = FeedbackRepository::new(store, events);
    match command {
        FeedbackCommands::Add { name, message } => {
            repo.submit(&name, &message).await?;
            println!("Thanks for your feedback, {name}!");
        }
        FeedbackCommands::List => {
            let all = repo.list().await?;
            print!("{}", render_feedback(&all));
        }
    }
    Ok(())
}

fn render_feedback(entries: &[Feedback]) -> String {
    if entries.is_empty() {
        return "No feedback yet.\n".to_owned();
    }
    entries
        .iter()
        .map(|f| format!("[{}] {}: {}\n", f.date, f.name, f.message))
        .collect()
}
