use std::error::Error;
use std::path::Path;
use std::sync::Arc;

use dotenvy::dotenv;
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;
use tracing::{error, info, warn};

mod cli;
mod config;
mod handlers;
mod llm;
mod state;
mod studio;
mod utils;

use cli::generate::{
    is_options_command, parse_generate_args, print_options, run_generate, GenerateOutput,
};
use config::CONFIG;
use handlers::commands;
use handlers::media::image_file_id;
use llm::{GeminiImageClient, ImageGenerator};
use state::AppState;
use utils::http::get_http_client;
use utils::logging::init_logging;

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase")]
enum Command {
    Start,
    Help,
    Mode(String),
    Style(String),
    Emotion(String),
    Background(String),
    Note(String),
    Options,
    Settings,
    Clear,
    Generate(String),
}

type HandlerResult = Result<(), Box<dyn Error + Send + Sync>>;

#[tokio::main]
async fn main() -> HandlerResult {
    dotenv().ok();
    let _guards = init_logging(&CONFIG.log_level, Path::new("logs"));

    let args: Vec<String> = std::env::args().collect();
    if is_options_command(&args) {
        print_options();
        return Ok(());
    }

    if CONFIG.gemini_api_key.trim().is_empty() {
        warn!("GEMINI_API_KEY is not set; generation requests will be rejected");
    }
    let generator: Arc<dyn ImageGenerator> = Arc::new(GeminiImageClient::from_config(
        get_http_client().clone(),
        &CONFIG,
    ));

    if let Some(generate_args) = parse_generate_args(&args, &CONFIG.output_dir)? {
        match run_generate(generate_args, generator).await? {
            GenerateOutput::File(path) => {
                info!("Saved generated image to {}", path.display());
                println!("{}", path.display());
            }
            GenerateOutput::DataUri(uri) => println!("{uri}"),
        }
        return Ok(());
    }

    if CONFIG.bot_token.trim().is_empty() {
        return Err("BOT_TOKEN is required unless running generate or options".into());
    }

    let bot = Bot::new(CONFIG.bot_token.clone());
    info!(
        model = generator.model(),
        "Starting TwitchMote AI bot"
    );
    let state = AppState::new(generator);

    let command_handler = dptree::entry()
        .filter_command::<Command>()
        .endpoint(handle_command);

    let handler = Update::filter_message()
        .branch(command_handler)
        .branch(
            dptree::filter(|msg: Message| image_file_id(&msg).is_some())
                .endpoint(handle_photo),
        )
        .endpoint(ignore_message);

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}

async fn handle_command(
    bot: Bot,
    state: AppState,
    message: Message,
    command: Command,
) -> HandlerResult {
    fn optional_arg(arg: String) -> Option<String> {
        if arg.trim().is_empty() {
            None
        } else {
            Some(arg)
        }
    }

    match command {
        Command::Start => commands::start_handler(bot, message).await?,
        Command::Help => commands::help_handler(bot, message).await?,
        Command::Mode(arg) => commands::mode_handler(bot, state, message, arg).await?,
        Command::Style(arg) => commands::style_handler(bot, state, message, arg).await?,
        Command::Emotion(arg) => commands::emotion_handler(bot, state, message, arg).await?,
        Command::Background(arg) => {
            commands::background_handler(bot, state, message, arg).await?
        }
        Command::Note(arg) => commands::note_handler(bot, state, message, arg).await?,
        Command::Options => commands::options_handler(bot, state, message).await?,
        Command::Settings => commands::settings_handler(bot, state, message).await?,
        Command::Clear => commands::clear_handler(bot, state, message).await?,
        Command::Generate(arg) => {
            let arg = optional_arg(arg);
            tokio::spawn(async move {
                if let Err(err) = commands::generate_handler(bot, state, message, arg).await {
                    error!("generate handler failed: {err}");
                }
            });
        }
    }
    Ok(())
}

async fn handle_photo(bot: Bot, state: AppState, message: Message) -> HandlerResult {
    tokio::spawn(async move {
        if let Err(err) = commands::photo_handler(bot, state, message).await {
            error!("photo handler failed: {err}");
        }
    });
    Ok(())
}

async fn ignore_message(_message: Message) -> HandlerResult {
    Ok(())
}
