use anyhow::Result;
use clap::{Parser, Subcommand};
use movie_scene_generator::app::App;
use movie_scene_generator::models::{GenerationOptions, Style};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "movie-scene-generator")]
#[command(about = "Generate dialogue and scene images for top-rated movies")]
struct CliArgs {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the current top movies.
    List,
    /// Print details for the movie at RANK.
    Details {
        #[arg(value_name = "RANK")]
        rank: usize,
    },
    /// Generate dialogue, a scene description and an image for the movie at RANK.
    Generate {
        #[arg(value_name = "RANK")]
        rank: usize,
        /// Number of speaking characters (2-4).
        #[arg(long, default_value = "2")]
        characters: String,
        /// Maximum dialogue length in words.
        #[arg(long, default_value = "500")]
        words: String,
        #[arg(long, default_value = "Interior")]
        location: String,
        /// Marvel, Futuristic, Cartoon, Realistic, or any custom style.
        #[arg(long, default_value = "Realistic", value_parser = parse_style)]
        style: Style,
    },
}

fn parse_style(input: &str) -> std::result::Result<Style, String> {
    if input.trim().is_empty() {
        return Err("Style must not be empty".to_string());
    }
    input.parse().map_err(|_| format!("Invalid style '{}'", input))
}

async fn execute(app: &mut App, command: Command) -> movie_scene_generator::Result<()> {
    match command {
        Command::List => {
            for (rank, movie) in app.load_movies().await.iter().enumerate() {
                println!("{}. {}", rank + 1, movie.title);
            }
        }
        Command::Details { rank } => {
            app.load_movies().await;
            println!("{}", app.select(rank).await?.describe());
        }
        Command::Generate {
            rank,
            characters,
            words,
            location,
            style,
        } => {
            app.load_movies().await;
            // An unknown rank leaves nothing selected; the pipeline reports it.
            if let Err(e) = app.select(rank).await {
                info!("No movie selected for rank {}: {}", rank, e);
            }

            let options = GenerationOptions::default()
                .with_character_count(characters)
                .with_dialogue_max_words(words)
                .with_location(location)
                .with_style(style);
            let run = app.generate(&options).await?;

            let result = run.result();
            println!("=== Scene Description ===\n{}\n", result.scene_description);
            println!("Characters: {}", result.character_names.join(", "));
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "movie_scene_generator=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting movie-scene-generator");

    let args = CliArgs::parse();

    match App::new() {
        Ok(mut app) => match execute(&mut app, args.command).await {
            Ok(()) => Ok(()),
            Err(e) => {
                error!("Command failed: {}", e);
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        },
        Err(e) => {
            error!("Failed to initialize application: {}", e);
            std::process::exit(1);
        }
    }
}
