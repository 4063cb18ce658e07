use anyhow::Result;
use async_trait::async_trait;
use serde_json::json;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use threadloom::prelude::*;
use threadloom::{summarization_prompt, StoreConfig, ThreadStoreBuilder};

/// Stands in for an LLM call: renders the summarization prompt and keeps
/// the first line of each message.
struct FirstLineSummarizer;

#[async_trait]
impl Summarizer for FirstLineSummarizer {
    async fn summarize(&self, active_history: &[ThreadMessageRecord]) -> anyhow::Result<Message> {
        let prompt = summarization_prompt(active_history);
        tracing::debug!(prompt_chars = prompt.len(), "Built summarization prompt");

        let recap: Vec<String> = active_history
            .iter()
            .filter_map(|record| serde_json::from_value::<Message>(record.message.clone()).ok())
            .map(|message| {
                let text = message.token_text();
                let first = text.lines().next().unwrap_or_default().to_string();
                format!("{}: {}", message.role(), first)
            })
            .collect();
        Ok(Message::ai(recap.join("\n")))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = StoreConfig::load()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    init_logging(&config);

    tracing::info!("Threadloom - Simple Example");
    tracing::info!("Storing threads under {}", config.storage.root_dir.display());

    let store = ThreadStoreBuilder::from_config(&config).build()?;

    // 1. Create a thread
    let thread = store
        .create_thread(
            NewThread::new("user_123")
                .with_title("Simple Example Chat")
                .with_model_selection(json!({"model": "gpt-4o-mini"})),
        )
        .await?;
    tracing::info!(thread_id = %thread.id, "Thread created");

    // 2. A short exchange, with the reply stored as a placeholder first
    let turns = [
        "Hello! Can you help me with Rust?",
        "How do I share state between tokio tasks?",
        "And when should I reach for a Mutex instead of a channel?",
    ];
    for (i, question) in turns.iter().enumerate() {
        store
            .upsert_message(
                &thread.id,
                UpsertMessage::from_message(&Message::human(*question))?
                    .with_usage(UsageInput::new(question.len() as u64 / 4, 0, 0)),
            )
            .await?;

        let reply_id = format!("reply-{}", i + 1);
        store
            .upsert_message(
                &thread.id,
                UpsertMessage::new(json!({"role": "assistant", "content": ""})).with_id(&reply_id),
            )
            .await?;
        let answer = format!(
            "Answer {}: wrap shared state in an Arc and pick the synchronization primitive \
             that matches how the tasks communicate. Channels move ownership; mutexes share it.",
            i + 1
        );
        store
            .upsert_message(
                &thread.id,
                UpsertMessage::from_message(&Message::ai(answer))?
                    .with_id(&reply_id)
                    .with_usage(UsageInput::new(120, 40, 850)),
            )
            .await?;
    }

    let loaded = store
        .get_thread(&thread.id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("thread {} vanished", thread.id))?;
    tracing::info!(
        messages = loaded.history.len(),
        context_size = loaded.context_size,
        output_tokens = loaded.usage.output_tokens,
        cost_usd = loaded.usage.total_cost_usd,
        "Conversation stored"
    );

    // 3. Compact once the active history outgrows the budget
    if let Some(outcome) = store
        .compact_if_needed(&thread.id, &config.compaction, &FirstLineSummarizer)
        .await?
    {
        tracing::info!(
            did_compact = outcome.did_compact,
            boundary = ?outcome.thread.last_compaction_ordinal,
            context_size = outcome.thread.context_size,
            "Compaction check finished"
        );
    }

    if let Some(window) = store.context_window(&thread.id).await? {
        tracing::info!(
            messages = window.messages.len(),
            context_size = window.context_size,
            "Context window ready for the next model call"
        );
    }

    // 4. Undo the compaction and list the user's threads
    store.rebuild_active_history(&thread.id).await?;
    let threads = store
        .list_threads(&ListThreadsQuery::for_user("user_123"))
        .await?;
    for info in &threads {
        tracing::info!(
            thread_id = %info.id,
            title = %info.title,
            messages = info.message_count,
            "Listed thread"
        );
    }

    Ok(())
}

fn init_logging(config: &StoreConfig) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    match config.logging.format.as_str() {
        "json" => {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            registry
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }
}
