//! # Shell Completion Module
//!
//! Completion scripts for `kadaikyoku`. Bash and fish get hand-written
//! scripts that ask the hidden `complete-levels` command for the labels of
//! the configured scale when completing `--min` and `--max`; the other
//! shells use the scripts clap_complete generates.
//!
//! ## Usage
//!
//! ```bash
//! # Generate bash completions
//! kadaikyoku completion bash > ~/.local/share/bash-completion/completions/kadaikyoku
//!
//! # Generate fish completions
//! kadaikyoku completion fish > ~/.config/fish/completions/kadaikyoku.fish
//! ```

use crate::cli::Shell;
use crate::difficulty::DifficultyScale;
use clap::Command;
use clap_complete::{generate, Shell as CompletionShell};
use std::io::{self, Write};

const BASH_COMPLETION: &str = r##"#!/bin/bash
# Kadaikyoku completion script with difficulty label completion
# Install with: kadaikyoku completion bash > ~/.local/share/bash-completion/completions/kadaikyoku

_kadaikyoku_levels() {
    # Labels of the configured scale (honours KADAIKYOKU_LEVELS)
    if command -v kadaikyoku >/dev/null 2>&1; then
        kadaikyoku complete-levels 2>/dev/null
    fi
}

_kadaikyoku() {
    local cur prev words cword
    _init_completion || return

    case "${prev}" in
        --min|--max)
            mapfile -t COMPREPLY < <(compgen -W "$(_kadaikyoku_levels)" -- "${cur}")
            return 0
            ;;
        --catalog)
            _filedir
            return 0
            ;;
        --levels|--channel|--seed)
            return 0
            ;;
        completion)
            COMPREPLY=($(compgen -W "bash zsh fish power-shell elvish" -- "${cur}"))
            return 0
            ;;
    esac

    local subcommands="song level course serve check completion help"
    local globals="--catalog --levels --channel --seed --json --help"

    local i command=""
    for ((i = 1; i < cword; i++)); do
        case "${words[i]}" in
            song|level|course|serve|check|completion|help)
                command="${words[i]}"
                break
                ;;
        esac
    done

    case "${command}" in
        "")
            COMPREPLY=($(compgen -W "$subcommands $globals --version" -- "${cur}"))
            ;;
        level|course)
            COMPREPLY=($(compgen -W "--min --max $globals" -- "${cur}"))
            ;;
        check)
            COMPREPLY=($(compgen -W "--normalize $globals" -- "${cur}"))
            ;;
        help)
            COMPREPLY=($(compgen -W "$subcommands" -- "${cur}"))
            ;;
        *)
            COMPREPLY=($(compgen -W "$globals" -- "${cur}"))
            ;;
    esac
} &&
complete -F _kadaikyoku kadaikyoku

# ex: filetype=sh
"##;

const FISH_COMPLETION: &str = r##"# Kadaikyoku completion script for Fish shell with difficulty label completion
# Install with: kadaikyoku completion fish > ~/.config/fish/completions/kadaikyoku.fish

# Labels of the configured scale (honours KADAIKYOKU_LEVELS)
function __kadaikyoku_levels
    if command -sq kadaikyoku
        kadaikyoku complete-levels 2>/dev/null
    end
end

complete -c kadaikyoku -e

# Global options
complete -c kadaikyoku -s h -l help -d 'Print help'
complete -c kadaikyoku -s V -l version -d 'Print version'
complete -c kadaikyoku -l catalog -r -F -d 'Song catalog file'
complete -c kadaikyoku -l levels -x -d 'Comma separated difficulty labels, easiest first'
complete -c kadaikyoku -l channel -x -d 'Only answer messages tagged with this channel'
complete -c kadaikyoku -l seed -x -d 'Seed the random source'
complete -c kadaikyoku -l json -d 'Print replies as JSON'

# Main commands
complete -c kadaikyoku -f -n '__fish_use_subcommand' -a 'song' -d 'Recommend one song from the whole catalog'
complete -c kadaikyoku -f -n '__fish_use_subcommand' -a 'level' -d 'Recommend one song within a level range'
complete -c kadaikyoku -f -n '__fish_use_subcommand' -a 'course' -d 'Build a course of three songs'
complete -c kadaikyoku -f -n '__fish_use_subcommand' -a 'serve' -d 'Answer chat commands read from standard input'
complete -c kadaikyoku -f -n '__fish_use_subcommand' -a 'check' -d 'Validate the catalog'
complete -c kadaikyoku -f -n '__fish_use_subcommand' -a 'completion' -d 'Generate shell completions'
complete -c kadaikyoku -f -n '__fish_use_subcommand' -a 'help' -d 'Print help for commands'

# level and course take bounds from the scale
complete -c kadaikyoku -f -n '__fish_seen_subcommand_from level course' -l min -x -a '(__kadaikyoku_levels)' -d 'Easiest level to include'
complete -c kadaikyoku -f -n '__fish_seen_subcommand_from level course' -l max -x -a '(__kadaikyoku_levels)' -d 'Hardest level to include'

complete -c kadaikyoku -f -n '__fish_seen_subcommand_from check' -l normalize -d 'Print the catalog in canonical form'
complete -c kadaikyoku -f -n '__fish_seen_subcommand_from completion' -a 'bash zsh fish power-shell elvish'
"##;

/// Write the completion script for `shell` to `out`.
///
/// # Errors
///
/// Returns any error from writing to `out`.
pub fn write_completions<W: Write>(shell: Shell, cmd: &mut Command, out: &mut W) -> io::Result<()> {
    match shell {
        Shell::Bash => out.write_all(BASH_COMPLETION.as_bytes()),
        Shell::Fish => out.write_all(FISH_COMPLETION.as_bytes()),
        Shell::Zsh | Shell::PowerShell | Shell::Elvish => {
            let name = cmd.get_name().to_string();
            generate(clap_shell(shell), cmd, name, out);
            Ok(())
        }
    }
}

/// clap_complete's shell for our [`Shell`]
#[must_use]
pub const fn clap_shell(shell: Shell) -> CompletionShell {
    match shell {
        Shell::Bash => CompletionShell::Bash,
        Shell::Zsh => CompletionShell::Zsh,
        Shell::Fish => CompletionShell::Fish,
        Shell::PowerShell => CompletionShell::PowerShell,
        Shell::Elvish => CompletionShell::Elvish,
    }
}

/// Write one difficulty label per line for the completion scripts
pub fn write_level_completions<W: Write>(scale: &DifficultyScale, out: &mut W) -> io::Result<()> {
    for label in scale.labels() {
        writeln!(out, "{label}")?;
    }
    Ok(())
}
