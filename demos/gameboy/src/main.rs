//! Scripted session between a handheld emulator core and a frontend
//!
//! Run with `RUST_LOG=debug` to see channel activity.

use std::sync::Arc;

use retrovars_core::{
    ChangeTiming, Channel, ChannelConfig, ChannelEvent, Variable, VariableRegistry, VariableResult,
    VariableValue,
};
use tracing_subscriber::EnvFilter;

fn options(colorize: bool) -> Vec<Variable> {
    let mut vars = vec![
        Variable::separator("Video"),
        Variable::boolean("gb_colorize", "Colorize", colorize)
            .with_description("Apply a palette to monochrome games")
            .with_on_change(|id, value| tracing::info!("core: colorize #{} -> {}", id, value)),
        Variable::int("frameskip", "Frameskip", 0, 10, 0).with_timing(ChangeTiming::Delayed),
        Variable::resolution("video_size", "Video size", 160, 144)
            .with_timing(ChangeTiming::Reset),
    ];
    // Options only ever grow at the end so retained positions keep their identity
    if colorize {
        vars.push(
            Variable::enumeration("gb_palette", "Palette", ["Gray", "Green", "Brown"], 1)
                .with_on_change(|id, value| tracing::info!("core: palette #{} -> {}", id, value)),
        );
    }
    vars.push(Variable::terminator());
    vars
}

fn run() -> VariableResult<()> {
    let mut config = ChannelConfig::default();
    config.presets.insert("gb_colorize".into(), true.into());
    config.presets.insert("gb_palette".into(), "Brown".into());

    let channel = Arc::new(Channel::with_config(config));
    let events = channel.subscribe();
    let registry = VariableRegistry::new(Arc::clone(&channel));

    // The core starts monochrome, then sees the preset and grows a palette option
    let summary = registry.declare(&options(false))?;
    tracing::info!("Declared {} variables", summary.active);
    if registry.get_as::<bool>(1)? {
        let summary = registry.redeclare(&options(true))?;
        tracing::info!("Redeclared: {} added, {} dropped", summary.added.len(), summary.dropped.len());
    }

    // The frontend edits a few settings
    channel.set_value_by_name("gb_palette", VariableValue::Enum(0))?;
    channel.set_value_by_name("frameskip", VariableValue::Int(2))?;
    if let Err(err) = channel.set_value_by_name("frameskip", VariableValue::Int(11)) {
        tracing::warn!("Rejected edit: {}", err);
    }

    for info in channel.descriptors() {
        match info.current {
            Some(value) => println!("{:>12} [{:?}] = {}", info.name, info.timing, value),
            None => println!("--- {} ---", info.display_name),
        }
    }

    for event in events.try_iter() {
        if let ChannelEvent::ValueChanged { id, value } = event {
            tracing::debug!("event: #{} changed to {}", id, value);
        }
    }

    channel.teardown();
    registry.reset();
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(err) = run() {
        tracing::error!("Session failed: {}", err);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_session_completes() {
        assert_eq!(run(), Ok(()));
    }

    #[test]
    fn test_options_grow_at_the_end() {
        let mono = options(false);
        let color = options(true);
        assert_eq!(color.len(), mono.len() + 1);
        for (a, b) in mono.iter().zip(&color).filter(|(a, _)| !a.is_terminator()) {
            assert_eq!(a.name, b.name);
        }
        assert_eq!(color[color.len() - 2].name, "gb_palette");
    }
}
