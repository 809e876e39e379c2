//! Stablescan - interactive retexturing session
//!
//! Reads single-key commands from stdin. The point cloud is one of the
//! synthetic test scenes; file ingestion is left to library users.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use stablescan::cloud::{PointCloud, synthetic};
use stablescan::core::{Error, logging};
use stablescan::generate::WebUiGenerator;
use stablescan::render::SoftwareRenderer;
use stablescan::session::{
    CaptureSession, CommandOutcome, CommandTable, SessionCommand, SessionConfig, diagnostics,
};

type Session = CaptureSession<SoftwareRenderer, WebUiGenerator>;

#[derive(Debug, Default)]
struct Args {
    config: Option<PathBuf>,
    prompt: Option<String>,
    webui: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    session: Option<String>,
    debug: bool,
    views: Option<usize>,
    scene: Option<String>,
}

fn parse_args() -> Result<Args, String> {
    let mut args = std::env::args().skip(1);
    let mut parsed = Args::default();

    fn value<T: std::str::FromStr>(flag: &str, v: Option<String>) -> Result<T, String> {
        let v = v.ok_or_else(|| format!("{} needs a value", flag))?;
        v.parse().map_err(|_| format!("invalid value for {}: {}", flag, v))
    }

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-c" | "--config" => parsed.config = Some(value(&arg, args.next())?),
            "-p" | "--prompt" => parsed.prompt = Some(value(&arg, args.next())?),
            "--webui" => parsed.webui = Some(value(&arg, args.next())?),
            "-W" | "--width" => parsed.width = Some(value(&arg, args.next())?),
            "-H" | "--height" => parsed.height = Some(value(&arg, args.next())?),
            "-s" | "--session" => parsed.session = Some(value(&arg, args.next())?),
            "--views" => parsed.views = Some(value(&arg, args.next())?),
            "--scene" => parsed.scene = Some(value(&arg, args.next())?),
            "-d" | "--debug" => parsed.debug = true,
            "-h" | "--help" | "help" => return Err("show_help".to_string()),
            other => return Err(format!("unknown argument: {}", other)),
        }
    }
    Ok(parsed)
}

fn print_help() {
    println!("Stablescan");
    println!("==========");
    println!();
    println!("Usage: stablescan [OPTIONS]");
    println!();
    println!("Options:");
    println!("  -c, --config <FILE>     Session config (JSON)");
    println!("  -p, --prompt <TEXT>     Default prompt (skips the prompt question)");
    println!("      --webui <URL>       Web UI address (default: http://127.0.0.1:7860)");
    println!("  -W, --width <N>         Capture width (default: 512)");
    println!("  -H, --height <N>        Capture height (default: 512)");
    println!("  -s, --session <NAME>    Session name for saved colors");
    println!("  -d, --debug             Enable diagnostic commands");
    println!("      --views <N>         Retexture N views around the cloud, then exit");
    println!("      --scene <NAME>      Synthetic scene: plane, tilted (default: tilted)");
}

fn build_config(args: &Args) -> Result<SessionConfig, Error> {
    let mut config = match &args.config {
        Some(path) => SessionConfig::load_sync(path)?,
        None => SessionConfig::default(),
    };
    if let Some(prompt) = &args.prompt {
        config.default_prompt = Some(prompt.clone());
    }
    if let Some(url) = &args.webui {
        config.generation.webui_url = url.clone();
    }
    if let Some(width) = args.width {
        config.width = width;
    }
    if let Some(height) = args.height {
        config.height = height;
    }
    if let Some(session) = &args.session {
        config.session_name = session.clone();
    }
    config.debug |= args.debug;
    config.validate()?;
    Ok(config)
}

fn build_scene(name: Option<&str>) -> Result<PointCloud, Error> {
    let mut cloud = match name.unwrap_or("tilted") {
        "plane" => synthetic::pixel_grid(256, 256),
        "tilted" => synthetic::tilted_plane(256, 256, 0.6),
        other => return Err(Error::Config(format!("unknown scene '{}'", other))),
    };
    cloud.normalize();
    Ok(cloud)
}

fn read_line(stdin: &mut impl BufRead, question: &str) -> io::Result<Option<String>> {
    print!("{}", question);
    io::stdout().flush()?;
    let mut line = String::new();
    if stdin.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

/// Capture, show the inputs, confirm, generate and merge
fn interactive_retexture(session: &mut Session, stdin: &mut impl BufRead) -> Result<(), Error> {
    let capture = session.capture()?;
    let dir = session.config().output_dir.clone();
    let color = diagnostics::write_png(&dir, "capture_color", capture.color_image.clone())?;
    let depth = diagnostics::write_png(&dir, "capture_depth", capture.depth_image.clone())?;
    println!("Captured {} points: {} / {}", capture.visible_points().len(), color.display(), depth.display());

    let answer = read_line(stdin, "Would you like to proceed? (Y/N): ")?.unwrap_or_default();
    if !answer.eq_ignore_ascii_case("y") {
        println!("Cancelled");
        return Ok(());
    }

    let prompt = match session.config().default_prompt.clone() {
        Some(prompt) => prompt,
        None => read_line(stdin, "Enter prompt: ")?.unwrap_or_default(),
    };
    if prompt.is_empty() {
        println!("Cancelled");
        return Ok(());
    }

    println!("Generating {}...", prompt);
    let image = session.generate(&capture, &prompt)?;
    let added = session.apply(&capture, &image)?;
    let generated = diagnostics::write_png(&dir, "generated", image)?;
    println!("Retextured {} new points ({})", added, generated.display());
    Ok(())
}

fn report(outcome: CommandOutcome) {
    match outcome {
        CommandOutcome::Retextured { new_points } => println!("Retextured {} new points", new_points),
        CommandOutcome::CameraMoved => {}
        CommandOutcome::Wrote(paths) => {
            for path in paths {
                println!("Wrote {}", path.display());
            }
        }
        CommandOutcome::Saved(path) => println!("Saved {}", path.display()),
        CommandOutcome::Loaded { points } => println!("Loaded {} retextured points", points),
        CommandOutcome::Reset => println!("Colors reset"),
        CommandOutcome::Pruned { remaining } => println!("{} points remain", remaining),
        CommandOutcome::Swept { views, new_points } => {
            println!("Retextured {} new points over {} views", new_points, views)
        }
        CommandOutcome::EmptyView => println!("Nothing visible from here"),
    }
}

fn run(args: Args) -> Result<(), Error> {
    let config = build_config(&args)?;
    let cloud = build_scene(args.scene.as_deref())?;
    let generator = WebUiGenerator::new(config.generation.clone())?;
    let table = CommandTable::new(config.debug);
    let mut session = CaptureSession::new(cloud, SoftwareRenderer::new(), generator, config)?;

    if let Some(views) = args.views {
        let outcome = session.execute(SessionCommand::Sweep { views }, args.prompt.as_deref())?;
        report(outcome);
        return Ok(());
    }

    println!("Commands (q to quit, h for help):\n{}", table.help());
    let stdin = io::stdin();
    let mut stdin = stdin.lock();
    while let Some(line) = read_line(&mut stdin, "> ")? {
        for key in line.chars().filter(|c| !c.is_whitespace()) {
            match key {
                'q' => return Ok(()),
                'h' => {
                    println!("{}", table.help());
                    continue;
                }
                _ => {}
            }
            let Some(command) = table.lookup(key) else {
                println!("Unbound key '{}'", key);
                continue;
            };
            let result = match command {
                SessionCommand::Retexture => interactive_retexture(&mut session, &mut stdin),
                other => session.execute(other, None).map(report),
            };
            match result {
                Ok(()) => {}
                Err(Error::EmptyDepthRange) => println!("Nothing visible from here"),
                Err(e) if e.is_expected() => log::warn!("{}", e),
                Err(e) => log::error!("{:?} failed: {}", command, e),
            }
        }
    }
    Ok(())
}

fn main() {
    logging::init();

    let args = match parse_args() {
        Ok(args) => args,
        Err(e) if e == "show_help" => {
            print_help();
            return;
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            print_help();
            std::process::exit(1);
        }
    };

    if let Err(e) = run(args) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}
