//! Line commands for the interactive `cull` loop.
//!
//! Keys map onto session [`Intent`]s the way a keyboard handler would:
//!
//! | Input | Action |
//! |-------|--------|
//! | `n`, `→` / `p`, `←` | next / previous photo |
//! | `0`-`5` | rate the current photo |
//! | `z` | toggle zoom |
//! | `pan <dx> <dy>` | pan the magnified photo |
//! | `pinch <scale>`, `release` | continuous zoom, end of pinch |
//! | `f <0-5>` | filter (0 = any rated) |
//! | `s <name>`, `a` | toggle selection, toggle select-all |
//! | `r`, `b` | advance to review, go back |
//! | `grid`, `show`, `json` | print the review grid, the current view, the view as JSON |
//! | `export`, `channels`, `pick`, `forget` | export and channel management |
//! | `channel`, `res`, `quality`, `dest` | export form fields |
//! | `import <paths..>`, `reset`, `help`, `q` | session control |

use crate::export::ChannelKind;
use crate::imaging::{Quality, RenderTarget};
use crate::session::Intent;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq)]
pub enum ReplCommand {
    Intent(Intent),
    Pinch(f32),
    Release,
    Grid,
    Show,
    Json,
    Import(Vec<PathBuf>),
    Export,
    Channels,
    Pick,
    Forget,
    SetChannel(ChannelKind),
    SetResolution(RenderTarget),
    SetQuality(Quality),
    SetDestination(String),
    Reset,
    Help,
    Quit,
}

pub const HELP: &str = "\
n/p        next / previous photo
0-5        rate current photo (0 clears)
z          toggle zoom
pan DX DY  pan while zoomed
pinch S    pinch zoom by scale S; release to finish
f N        filter: 0 = any rated, 1-5 = exact rating
s NAME     toggle selection of NAME
a          toggle select-all over the filtered photos
r / b      review / back
grid       print the review grid
show       print the current view
json       print the current view as JSON
channel C  export channel: archive, folder or share
res R      export resolution in px, or 'original'
quality Q  export quality, 1-100
dest NAME  export destination name
export     export the selection
channels   list channel availability
pick       choose the export directory now
forget     forget the chosen directory
import P.. import new files (replaces the batch)
reset      clear the session
q          quit";

fn parse_number<T: std::str::FromStr>(arg: Option<&str>, what: &str) -> Result<T, String> {
    let raw = arg.ok_or_else(|| format!("{what} needs a value"))?;
    raw.parse()
        .map_err(|_| format!("{what}: '{raw}' is not a valid number"))
}

/// Parse one input line. Empty lines are an error the caller can ignore.
pub fn parse_line(line: &str) -> Result<ReplCommand, String> {
    let line = line.trim();
    let (head, rest) = line
        .split_once(char::is_whitespace)
        .map_or((line, ""), |(h, r)| (h, r.trim()));
    let mut args = rest.split_whitespace();

    let command = match head {
        "" => return Err("empty command".into()),
        "n" | "next" | "→" => ReplCommand::Intent(Intent::Next),
        "p" | "prev" | "←" => ReplCommand::Intent(Intent::Previous),
        "z" | "zoom" => ReplCommand::Intent(Intent::ToggleZoom),
        "a" | "all" => ReplCommand::Intent(Intent::ToggleSelectAll),
        "r" | "review" => ReplCommand::Intent(Intent::Advance),
        "b" | "back" => ReplCommand::Intent(Intent::Back),
        "pan" => {
            let dx = parse_number(args.next(), "pan")?;
            let dy = parse_number(args.next(), "pan")?;
            ReplCommand::Intent(Intent::Pan { dx, dy })
        }
        "pinch" => ReplCommand::Pinch(parse_number(args.next(), "pinch")?),
        "release" => ReplCommand::Release,
        "f" | "filter" => ReplCommand::Intent(Intent::SetFilter(parse_number(args.next(), "filter")?)),
        "s" | "select" => {
            if rest.is_empty() {
                return Err("select needs a file name".into());
            }
            ReplCommand::Intent(Intent::ToggleSelection(rest.to_string()))
        }
        "grid" => ReplCommand::Grid,
        "show" => ReplCommand::Show,
        "json" => ReplCommand::Json,
        "import" => {
            let paths: Vec<PathBuf> = args.map(PathBuf::from).collect();
            if paths.is_empty() {
                return Err("import needs at least one path".into());
            }
            ReplCommand::Import(paths)
        }
        "export" => ReplCommand::Export,
        "channels" => ReplCommand::Channels,
        "pick" => ReplCommand::Pick,
        "forget" => ReplCommand::Forget,
        "channel" => ReplCommand::SetChannel(
            args.next()
                .ok_or("channel needs a value")?
                .parse()?,
        ),
        "res" | "resolution" => ReplCommand::SetResolution(
            args.next()
                .ok_or("res needs a value")?
                .parse()?,
        ),
        "quality" => {
            let percent: u32 = parse_number(args.next(), "quality")?;
            if !(1..=100).contains(&percent) {
                return Err("quality must be between 1 and 100".into());
            }
            ReplCommand::SetQuality(Quality::from_percent(percent))
        }
        "dest" | "destination" => {
            if rest.is_empty() {
                return Err("dest needs a name".into());
            }
            ReplCommand::SetDestination(rest.to_string())
        }
        "reset" => ReplCommand::Reset,
        "help" | "?" => ReplCommand::Help,
        "q" | "quit" | "exit" => ReplCommand::Quit,
        digit if digit.len() == 1 && digit.as_bytes()[0].is_ascii_digit() => {
            ReplCommand::Intent(Intent::SetRating(digit.as_bytes()[0] - b'0'))
        }
        other => return Err(format!("unknown command '{other}' (try 'help')")),
    };
    Ok(command)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn navigation_and_rating_keys() {
        assert_eq!(parse_line("n").unwrap(), ReplCommand::Intent(Intent::Next));
        assert_eq!(parse_line(" p ").unwrap(), ReplCommand::Intent(Intent::Previous));
        assert_eq!(parse_line("4").unwrap(), ReplCommand::Intent(Intent::SetRating(4)));
        // Range is enforced by the session, not the parser.
        assert_eq!(parse_line("9").unwrap(), ReplCommand::Intent(Intent::SetRating(9)));
    }

    #[test]
    fn pan_takes_two_numbers() {
        assert_eq!(
            parse_line("pan 10 -4.5").unwrap(),
            ReplCommand::Intent(Intent::Pan { dx: 10.0, dy: -4.5 })
        );
        assert!(parse_line("pan 10").is_err());
        assert!(parse_line("pan x y").is_err());
    }

    #[test]
    fn select_keeps_names_with_spaces() {
        assert_eq!(
            parse_line("s  my photo.jpg").unwrap(),
            ReplCommand::Intent(Intent::ToggleSelection("my photo.jpg".into()))
        );
        assert!(parse_line("s").is_err());
    }

    #[test]
    fn export_form_fields() {
        assert_eq!(
            parse_line("channel folder").unwrap(),
            ReplCommand::SetChannel(ChannelKind::Folder)
        );
        assert_eq!(
            parse_line("res original").unwrap(),
            ReplCommand::SetResolution(RenderTarget::Original)
        );
        assert_eq!(
            parse_line("res 1600").unwrap(),
            ReplCommand::SetResolution(RenderTarget::MaxDimension(1600))
        );
        assert_eq!(
            parse_line("quality 85").unwrap(),
            ReplCommand::SetQuality(Quality::from_percent(85))
        );
        assert!(parse_line("quality 0").is_err());
        assert_eq!(
            parse_line("dest Best of May").unwrap(),
            ReplCommand::SetDestination("Best of May".into())
        );
    }

    #[test]
    fn import_collects_paths() {
        assert_eq!(
            parse_line("import a.jpg shoot/").unwrap(),
            ReplCommand::Import(vec![PathBuf::from("a.jpg"), PathBuf::from("shoot/")])
        );
        assert!(parse_line("import").is_err());
    }

    #[test]
    fn unknown_and_empty_lines_error() {
        assert!(parse_line("").is_err());
        assert!(parse_line("dance").unwrap_err().contains("help"));
    }
}
