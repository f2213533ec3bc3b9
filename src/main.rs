use std::env;

use anyhow::{anyhow, Context};
use tandem_lessons::config::LessonConfig;
use tandem_lessons::core::lesson_gen::{
    CefrLevel, LanguageDirection, LessonGenerationEngine, LessonGenerationOptions,
    LessonGenerationParams, LessonType,
};

const USAGE: &str = "usage: tandem-lessons [--bg] [TYPE] [LEVEL] [CATEGORY...]\n\
    \n  TYPE      vocabulary | grammar | mixed | cultural | contextual (default: vocabulary)\
    \n  LEVEL     A1 | A2 | B1 | B2 | C1 (default: A1)\
    \n  --bg      learner reads Bulgarian and learns German";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let (config, config_origin) = LessonConfig::load();

    // Initialize logging, then report how the config was found
    let _log_guard = tandem_lessons::core::logging::init(&config.logging);
    log::info!("{} v{} starting", tandem_lessons::NAME, tandem_lessons::VERSION);
    config_origin.log();

    let args: Vec<String> = env::args().skip(1).collect();
    if args.iter().any(|a| a == "-h" || a == "--help") {
        println!("{USAGE}");
        return Ok(());
    }
    let params = parse_args(&args)?;

    let engine = LessonGenerationEngine::from_config(&config)
        .await
        .with_context(|| {
            format!(
                "loading vocabulary from {}",
                config.data.vocabulary_file.display()
            )
        })?;

    match engine
        .generate_lesson(&params, &LessonGenerationOptions::default())
        .await
    {
        Ok(lesson) => {
            println!("{}", serde_json::to_string_pretty(&lesson)?);
            Ok(())
        }
        Err(e) => {
            log::error!("Lesson generation failed: {e}");
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

fn parse_args(args: &[String]) -> anyhow::Result<LessonGenerationParams> {
    let mut direction = LanguageDirection::GermanToBulgarian;
    let mut positional = Vec::new();
    for arg in args {
        match arg.as_str() {
            "--bg" => direction = LanguageDirection::BulgarianToGerman,
            flag if flag.starts_with("--") => {
                return Err(anyhow!("unknown flag {flag}\n\n{USAGE}"));
            }
            _ => positional.push(arg.as_str()),
        }
    }

    let mut positional = positional.into_iter();
    let lesson_type = match positional.next() {
        Some(t) => t.parse::<LessonType>().map_err(|e| anyhow!("{e}\n\n{USAGE}"))?,
        None => LessonType::Vocabulary,
    };
    let difficulty = match positional.next() {
        Some(l) => l.parse::<CefrLevel>().map_err(|e| anyhow!("{e}\n\n{USAGE}"))?,
        None => CefrLevel::A1,
    };

    Ok(LessonGenerationParams::new(lesson_type, difficulty)
        .with_categories(positional)
        .with_direction(direction))
}
