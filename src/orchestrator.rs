use crate::args::Args;
use crate::config::{self, ResolvedProfile};
use crate::process::DetachedSpawner;
use crate::sequencer::{RunReport, SequencePlan, Sequencer, ThreadSleeper};
use crate::splash::WaylandSplash;
use crate::wayland::WaylandSession;
use eyre::{Result, WrapErr};
use std::io::{self, Write};

#[derive(Debug)]
pub enum Outcome {
    /// The profile had no entries, or no profile matched.
    NothingToLaunch,
    DryRun,
    Completed(RunReport),
}

/// Detect the resolution, resolve the profile and launch it.
///
/// Only an unreadable configuration or an undetectable resolution is an
/// error; everything else is logged and skipped.
pub fn run(args: &Args) -> Result<Outcome> {
    log::info!(
        "Starting. Executable directory: {}",
        config::exe_dir().map(|d| d.display().to_string()).unwrap_or_default()
    );

    let mut session = None;
    let resolution = match &args.resolution {
        Some(resolution) => {
            log::info!("Using resolution {} from the command line", resolution);
            resolution.clone()
        }
        None => {
            let detected = WaylandSession::connect(args.display.as_deref())
                .and_then(|s| Ok((s.resolution()?, s)))
                .wrap_err("could not detect the display resolution")?;
            session = Some(detected.1);
            detected.0
        }
    };

    let profile = load_profile(args.config.as_deref(), &resolution)?;
    if profile.entries.is_empty() {
        log::info!("No applications to launch.");
        return Ok(Outcome::NothingToLaunch);
    }

    let plan = SequencePlan::build(&profile.entries).log("launch entry");

    if args.dry_run {
        write_plan(&mut io::stdout().lock(), &resolution, &profile, &plan)?;
        return Ok(Outcome::DryRun);
    }

    let display = args.display.clone();
    let mut sequencer = Sequencer::new(DetachedSpawner::new(), ThreadSleeper, args.tick());
    let report = sequencer.run(&plan, &profile.options, |options| {
        let session = match session.take() {
            Some(session) => session,
            None => WaylandSession::connect(display.as_deref())?,
        };
        WaylandSplash::create(session, options)
    });

    log::info!(
        "Launched {} of {} program(s) in {} tick(s){}",
        report.launched.len(),
        plan.entries().len(),
        report.ticks,
        if report.presented { " behind the splash" } else { "" }
    );
    for failure in &report.failures {
        log::warn!(
            "Entry {} ({:?}) did not start: {}",
            failure.index + 1,
            failure.executable,
            failure.error
        );
    }
    Ok(Outcome::Completed(report))
}

/// Read the configuration and pick the profile for `resolution`.
pub fn load_profile(config_path: Option<&str>, resolution: &str) -> Result<ResolvedProfile> {
    let path = config::config_path(config_path)?;
    log::info!("Loading config from: {}", path.display());
    let store = config::load_config(&path)?;

    let profile = config::resolve(&store, &config::config_dir(&path), resolution);
    match &profile.section {
        Some(section) => log::info!(
            "Using profile [{}] with {} entr{}",
            section,
            profile.entries.len(),
            if profile.entries.len() == 1 { "y" } else { "ies" }
        ),
        None => log::info!(
            "No [{}] or [{}] section in {} (found: {})",
            resolution,
            config::FALLBACK_SECTION,
            path.display(),
            store.section_names().collect::<Vec<_>>().join(", ")
        ),
    }
    for diagnostic in &profile.diagnostics {
        log::warn!("{}", diagnostic);
    }
    Ok(profile)
}

pub fn write_plan(
    out: &mut impl Write,
    resolution: &str,
    profile: &ResolvedProfile,
    plan: &SequencePlan,
) -> io::Result<()> {
    writeln!(out, "Resolution: {}", resolution)?;
    writeln!(out, "Profile: [{}]", profile.section.as_deref().unwrap_or("-"))?;
    writeln!(out, "Total wait: {}s", plan.total_wait_seconds())?;
    if let Some(animation) = &profile.options.animation {
        writeln!(
            out,
            "Animation: {}{}",
            animation.path.display(),
            if animation.looping { " (loop)" } else { "" }
        )?;
    }
    for (i, entry) in plan.entries().iter().enumerate() {
        let mut command = quote(&entry.executable);
        for arg in &entry.arguments {
            command.push(' ');
            command.push_str(&quote(arg));
        }
        if entry.wait_seconds > 0.0 {
            writeln!(out, "  {}. {} (wait {}s)", i + 1, command, entry.wait_seconds)?;
        } else {
            writeln!(out, "  {}. {}", i + 1, command)?;
        }
    }
    Ok(())
}

/// Shell-quote a word for display; words `shlex` cannot quote are shown as-is.
fn quote(word: &str) -> String {
    shlex::try_quote(word)
        .map(|quoted| quoted.into_owned())
        .unwrap_or_else(|_| word.to_string())
}
