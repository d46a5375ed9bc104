//! Command execution handlers

use std::fs;
use std::path::PathBuf;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::config::Config;
use crate::error::{FovkitError, Result};
use crate::loader::{load_from_tree, TreeLoadOptions};
use crate::models::StackInfo;
use crate::{ome, paths};

fn resolve_output(explicit: &Option<PathBuf>, config: &Config) -> Result<PathBuf> {
    if let Some(output) = explicit {
        return Ok(output.clone());
    }
    if let Some(output) = &config.general.output_dir {
        return Ok(output.clone());
    }
    Ok(std::env::current_dir()?)
}

fn spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::with_template("{spinner:.green} {msg}").unwrap());
    pb
}

/// Execute the convert command
pub fn execute_convert(args: &super::ConvertArgs, config: &Config) -> Result<()> {
    let output = resolve_output(&args.output, config)?;
    fs::create_dir_all(&output)?;

    let pb = spinner();
    pb.set_message(format!("Loading FOVs from {}...", args.data_dir.display()));

    let tree_options = TreeLoadOptions {
        img_sub_folder: args
            .sub_folder
            .clone()
            .or_else(|| config.loading.img_sub_folder.clone()),
        fovs: if args.fovs.is_empty() { None } else { Some(args.fovs.clone()) },
        channels: if args.channels.is_empty() { None } else { Some(args.channels.clone()) },
        max_image_size: None,
    };
    let stack = load_from_tree(&args.data_dir, &tree_options)?;

    pb.set_message(format!(
        "Writing {} OME-TIFFs ({} channels each)...",
        stack.fovs().len(),
        stack.channels().len()
    ));
    let compression = args.compression.unwrap_or(config.conversion.compression);
    let written = ome::write_ome_per_fov(&stack, &output, compression)?;

    pb.finish_with_message(format!("Created {} OME-TIFFs in {}", written.len(), output.display()));
    Ok(())
}

/// Execute the extract command
pub fn execute_extract(args: &super::ExtractArgs, config: &Config) -> Result<()> {
    use indicatif::ParallelProgressIterator;
    use rayon::prelude::*;

    let output = resolve_output(&args.output, config)?;
    fs::create_dir_all(&output)?;

    let pb = ProgressBar::new(args.input.len() as u64);
    pb.set_style(
        ProgressStyle::with_template("[{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("█▓▒░ "),
    );

    let unpacked: Vec<PathBuf> = args
        .input
        .par_iter()
        .progress_with(pb.clone())
        .map(|input| ome::ome_to_fov(input, &output))
        .collect::<Result<Vec<_>>>()?;

    pb.finish_with_message(format!("Unpacked {} FOVs into {}", unpacked.len(), output.display()));
    Ok(())
}

/// Execute the info command
pub fn execute_info(args: &super::InfoArgs, config: &Config) -> Result<()> {
    let info = if args.path.is_dir() {
        let tree_options = TreeLoadOptions {
            img_sub_folder: args
                .sub_folder
                .clone()
                .or_else(|| config.loading.img_sub_folder.clone()),
            ..Default::default()
        };
        load_from_tree(&args.path, &tree_options)?.summary()
    } else {
        ome::describe(&args.path)?
    };

    match args.format {
        super::InfoFormat::Pretty => print_info(&info),
        super::InfoFormat::Json => println!("{}", serde_json::to_string_pretty(&info)?),
        super::InfoFormat::Toml => println!(
            "{}",
            toml::to_string_pretty(&info).map_err(|err| FovkitError::config(err.to_string()))?
        ),
    }

    Ok(())
}

fn print_info(info: &StackInfo) {
    println!("{}", style("Stack Information").bold());
    println!("═══════════════════════════════════════");
    println!("FOVs:        {} ({})", info.fovs.len(), info.fovs.join(", "));
    println!(
        "{}:    {} ({})",
        capitalize(&info.channel_dim),
        info.channels.len(),
        info.channels.join(", ")
    );
    println!("Size:        {} x {} px", info.rows, info.cols);
    println!("Pixel type:  {}", info.pixel_type);
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Execute the list command
pub fn execute_list(args: &super::ListArgs, config: &Config) -> Result<()> {
    paths::validate_paths(&[&args.data_dir])?;

    if args.channels {
        let mut fovs = paths::list_folders(&args.data_dir, None, false, true)?;
        fovs.sort_by(|a, b| natord::compare(a, b));
        let first = fovs.first().ok_or_else(|| {
            FovkitError::validation(format!("no FOVs found in {}", args.data_dir.display()))
        })?;

        let sub_folder = args
            .sub_folder
            .clone()
            .or_else(|| config.loading.img_sub_folder.clone())
            .unwrap_or_default();
        let mut dir = args.data_dir.join(first);
        if !sub_folder.is_empty() {
            dir = dir.join(sub_folder);
        }

        let files = paths::list_files(&dir, Some(crate::models::IMAGE_EXTENSIONS), false, true)?;
        let mut channels = paths::remove_file_extensions(&files);
        channels.sort_by(|a, b| natord::compare(a, b));
        for channel in channels {
            println!("{channel}");
        }
    } else {
        let mut fovs = paths::list_folders(&args.data_dir, None, false, true)?;
        fovs.sort_by(|a, b| natord::compare(a, b));
        for fov in fovs {
            println!("{fov}");
        }
    }

    Ok(())
}

/// Execute the validate command
pub fn execute_validate(args: &super::ValidateArgs) -> Result<()> {
    let mut failures = 0usize;
    for path in &args.paths {
        match paths::validate_paths(std::slice::from_ref(path)) {
            Ok(()) => println!("{} {}", style("ok").green().bold(), path.display()),
            Err(err) => {
                failures += 1;
                println!("{} {}", style("missing").red().bold(), path.display());
                println!("    {err}");
            }
        }
    }

    if failures > 0 {
        return Err(FovkitError::validation(format!(
            "{failures} of {} paths failed validation",
            args.paths.len()
        )));
    }
    Ok(())
}

/// Execute the config command
pub fn execute_config(args: &super::ConfigArgs, config: &mut Config) -> Result<()> {
    match &args.command {
        super::ConfigCommands::Show => {
            let content = toml::to_string_pretty(config)
                .map_err(|err| FovkitError::config(err.to_string()))?;
            println!("{content}");
        }
        super::ConfigCommands::Reset => {
            Config::reset()?;
            println!("Configuration reset to defaults");
        }
        super::ConfigCommands::Set { key, value } => {
            config.set(key, value)?;
            config.save()?;
            println!("Set {key} = {value}");
        }
        super::ConfigCommands::Get { key } => match config.get(key) {
            Some(value) => println!("{value}"),
            None => println!("{}", style("(not set)").dim()),
        },
        super::ConfigCommands::Init { force } => {
            Config::init(*force)?;
            println!("Configuration file created at {}", Config::config_path()?.display());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("channels"), "Channels");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn test_resolve_output_prefers_explicit() {
        let mut config = Config::default();
        config.general.output_dir = Some(PathBuf::from("/from/config"));

        let explicit = Some(PathBuf::from("/explicit"));
        assert_eq!(resolve_output(&explicit, &config).unwrap(), PathBuf::from("/explicit"));
        assert_eq!(resolve_output(&None, &config).unwrap(), PathBuf::from("/from/config"));
    }
}
