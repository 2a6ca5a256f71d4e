use chrono::NaiveDateTime;
use clap::{Parser, Subcommand};
use serde::Serialize;

use reach_poster::capabilities::Capabilities;
use reach_poster::config::Config;
use reach_poster::context::AppContext;
use reach_poster::discovery::{self, hashtags, ScoreInput};
use reach_poster::error::{ReachPosterError, Result};
use reach_poster::scheduler::DueSlot;
use reach_poster::store::{NewPost, LOCAL_MINUTE_FORMAT};

#[derive(Parser, Debug)]
#[command(name = "reach-poster")]
#[command(about = "Generate, score and publish outreach posts from the command line")]
#[command(version = reach_poster::VERSION)]
struct Cli {
    /// JSON config file; the environment is used when omitted.
    #[arg(long, global = true, env = "REACH_POSTER_CONFIG")]
    config: Option<String>,

    #[arg(long, global = true)]
    db: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a caption and image for a theme.
    Generate {
        #[arg(long)]
        theme: String,
        /// Store the result as a draft.
        #[arg(long, default_value_t = false)]
        save: bool,
    },
    /// Score a caption for discoverability.
    Score {
        #[arg(long)]
        caption: String,
        /// Extra hashtags; tags inside the caption are always counted.
        #[arg(long = "hashtag")]
        hashtags: Vec<String>,
        #[arg(long = "keyword")]
        keywords: Vec<String>,
    },
    /// List the schedules due at a minute, optionally firing them.
    Due {
        /// Local minute as `YYYY-MM-DD HH:MM`; defaults to now.
        #[arg(long)]
        at: Option<String>,
        #[arg(long, default_value_t = false)]
        run: bool,
    },
    /// Publish an already hosted image to Instagram.
    Publish {
        #[arg(long)]
        image_url: String,
        #[arg(long)]
        caption: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    reach_poster::logging::init_tracing("reach_poster");
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(db) = cli.db {
        config.db_path = Some(db);
    }

    match cli.command {
        Command::Generate { theme, save } => generate(config, &theme, save).await,
        Command::Score {
            caption,
            hashtags,
            keywords,
        } => score(&config, &caption, hashtags, &keywords),
        Command::Due { at, run } => due(config, at.as_deref(), run).await,
        Command::Publish { image_url, caption } => publish(&config, &image_url, &caption).await,
    }
}

fn print_json(value: &impl Serialize) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value)
        .map_err(|e| ReachPosterError::Serialization(e.to_string()))?;
    println!("{rendered}");
    Ok(())
}

async fn generate(config: Config, theme: &str, save: bool) -> Result<()> {
    if theme.trim().is_empty() {
        return Err(ReachPosterError::MissingTheme);
    }
    let ctx = AppContext::new(config).await?;
    let pipeline = ctx.capabilities.pipeline()?;
    let content = pipeline.generate(theme).await?;
    let report = ctx
        .capabilities
        .amplify
        .optimize(&content.caption, &content.image_prompt, theme)
        .await;

    if save {
        let post = ctx
            .store
            .create_post(&NewPost::manual(
                content.theme.clone(),
                content.caption.clone(),
                content.image_url.clone(),
                None,
            ))
            .await?;
        eprintln!("Saved draft #{}", post.id);
    }
    print_json(&serde_json::json!({
        "content": content,
        "reach_amplify": report,
    }))
}

fn score(config: &Config, caption: &str, extra: Vec<String>, keywords: &[String]) -> Result<()> {
    let mut tags = hashtags::extract(caption);
    tags.extend(extra.into_iter().map(|tag| {
        if tag.starts_with('#') {
            tag
        } else {
            format!("#{tag}")
        }
    }));
    let tags = hashtags::dedupe(tags, usize::MAX);
    let result = discovery::score(&ScoreInput {
        caption,
        hashtags: &tags,
        keywords,
        local_terms: &config.organization.local_terms,
    });
    print_json(&result)
}

async fn due(config: Config, at: Option<&str>, run: bool) -> Result<()> {
    let slot = match at {
        Some(raw) => NaiveDateTime::parse_from_str(raw.trim(), LOCAL_MINUTE_FORMAT)
            .map(DueSlot::from_local)
            .map_err(|_| {
                ReachPosterError::Validation(format!("Expected YYYY-MM-DD HH:MM, got '{raw}'"))
            })?,
        None => DueSlot::now(),
    };
    let ctx = AppContext::new(config).await?;
    let schedules = ctx.store.due_schedules(&slot).await?;
    for schedule in &schedules {
        println!(
            "#{} {} ({}, auto_post={})",
            schedule.id,
            schedule.name,
            schedule.theme_mode.as_str(),
            schedule.auto_post
        );
    }
    if schedules.is_empty() {
        println!("No schedules due at {}", slot.minute_key);
    }
    if run {
        let fired = ctx.runner.tick_at(&slot).await?;
        println!("Fired {fired} of {} schedule(s)", schedules.len());
    }
    Ok(())
}

async fn publish(config: &Config, image_url: &str, caption: &str) -> Result<()> {
    let capabilities = Capabilities::resolve(config);
    let publisher = capabilities.publisher()?;
    let published = publisher.publish(image_url, caption).await?;
    print_json(&published)
}
