/// Parser for the parameter panel's command line (`:eye 1 2 3`, `:fov 60`, ...)
use nalgebra::{Point3, Vector3};
use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{alpha1, char, multispace0, multispace1, u8 as small_uint},
    combinator::{all_consuming, map, map_opt, opt, value},
    number::complete::float,
    sequence::{delimited, preceded, tuple},
    IResult,
};

use crate::error::{Result, VisualizerError};
use crate::stage::StageKind;
use crate::state::DisplayMode;

/// A parameter edit typed into the panel
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    Eye(Point3<f32>),
    At(Point3<f32>),
    Up(Vector3<f32>),
    Fov(f32),
    Near(f32),
    Far(f32),
    Clip { near: f32, far: f32 },
    Mode(DisplayMode),
    /// `None` toggles
    Markers(Option<bool>),
    Model { row: usize, col: usize, value: f32 },
    Reset,
}

/// Parse one command line; a leading `:` is optional
pub fn parse_command(input: &str) -> Result<Command> {
    let line = input.trim();
    let line = line.strip_prefix(':').unwrap_or(line);
    match all_consuming(delimited(multispace0, command, multispace0))(line) {
        Ok((_, command)) => Ok(command),
        Err(_) => Err(VisualizerError::Command(format!("unrecognized command `{}`", input.trim()))),
    }
}

/// Parse a display mode on its own: `all`, a stage name or `0`-`4`
pub fn parse_display_mode(input: &str) -> Result<DisplayMode> {
    match all_consuming(delimited(multispace0, display_mode, multispace0))(input) {
        Ok((_, mode)) => Ok(mode),
        Err(_) => Err(VisualizerError::Command(format!("unknown display mode `{}`", input.trim()))),
    }
}

fn command(input: &str) -> IResult<&str, Command> {
    alt((
        map(preceded(tag("eye"), point), Command::Eye),
        map(preceded(tag("at"), point), Command::At),
        map(preceded(tag("up"), triple), |(x, y, z)| Command::Up(Vector3::new(x, y, z))),
        map(preceded(tag("fov"), number), Command::Fov),
        map(preceded(tag("near"), number), Command::Near),
        map(preceded(tag("far"), number), Command::Far),
        map(preceded(tag("clip"), tuple((number, number))), |(near, far)| {
            Command::Clip { near, far }
        }),
        // before "mode", which it starts with
        map(preceded(tag("model"), tuple((index, index, number))), |(row, col, value)| {
            Command::Model { row, col, value }
        }),
        map(preceded(tag("mode"), preceded(multispace1, display_mode)), Command::Mode),
        map(preceded(tag("markers"), opt(preceded(multispace1, on_off))), Command::Markers),
        value(Command::Reset, tag("reset")),
    ))(input)
}

/// Whitespace and/or a single comma between arguments
fn separator(input: &str) -> IResult<&str, ()> {
    value((), tuple((multispace0, opt(char(',')), multispace0)))(input)
}

fn number(input: &str) -> IResult<&str, f32> {
    preceded(separator, float)(input)
}

fn index(input: &str) -> IResult<&str, usize> {
    map(preceded(separator, small_uint), usize::from)(input)
}

/// Three numbers, optionally wrapped in parentheses as the panel prints them
fn triple(input: &str) -> IResult<&str, (f32, f32, f32)> {
    preceded(
        multispace0,
        delimited(
            opt(char('(')),
            tuple((number, number, number)),
            preceded(multispace0, opt(char(')'))),
        ),
    )(input)
}

fn point(input: &str) -> IResult<&str, Point3<f32>> {
    map(triple, |(x, y, z)| Point3::new(x, y, z))(input)
}

fn display_mode(input: &str) -> IResult<&str, DisplayMode> {
    alt((
        map_opt(small_uint, DisplayMode::from_digit),
        map_opt(alpha1, |name: &str| match name {
            "all" => Some(DisplayMode::All),
            "local" => Some(DisplayMode::Single(StageKind::Local)),
            "world" => Some(DisplayMode::Single(StageKind::World)),
            "view" => Some(DisplayMode::Single(StageKind::View)),
            "clip" => Some(DisplayMode::Single(StageKind::Clip)),
            _ => None,
        }),
    ))(input)
}

fn on_off(input: &str) -> IResult<&str, bool> {
    alt((value(true, tag("on")), value(false, tag("off"))))(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_vectors() {
        assert_eq!(
            parse_command("eye 1 2.5 -3").unwrap(),
            Command::Eye(Point3::new(1.0, 2.5, -3.0))
        );
        assert_eq!(
            parse_command(":at (0.00, 1.00, 0.00)").unwrap(),
            Command::At(Point3::new(0.0, 1.0, 0.0))
        );
        assert_eq!(parse_command("up 0,1,0").unwrap(), Command::Up(Vector3::y()));
    }

    #[test]
    fn test_parse_scalars() {
        assert_eq!(parse_command("fov 60").unwrap(), Command::Fov(60.0));
        assert_eq!(parse_command("  near 0.25 ").unwrap(), Command::Near(0.25));
        assert_eq!(parse_command("far 32").unwrap(), Command::Far(32.0));
        assert_eq!(
            parse_command("clip 1 10").unwrap(),
            Command::Clip { near: 1.0, far: 10.0 }
        );
    }

    #[test]
    fn test_parse_mode_by_digit_and_name() {
        assert_eq!(parse_command("mode 0").unwrap(), Command::Mode(DisplayMode::All));
        assert_eq!(
            parse_command("mode 3").unwrap(),
            Command::Mode(DisplayMode::Single(StageKind::View))
        );
        assert_eq!(
            parse_command("mode clip").unwrap(),
            Command::Mode(DisplayMode::Single(StageKind::Clip))
        );
        assert!(parse_command("mode 7").is_err());
        assert_eq!(parse_display_mode("world").unwrap(), DisplayMode::Single(StageKind::World));
        assert_eq!(parse_display_mode(" 0 ").unwrap(), DisplayMode::All);
        assert!(parse_display_mode("everything").is_err());
    }

    #[test]
    fn test_model_is_not_taken_for_mode() {
        assert_eq!(
            parse_command("model 0 3 1.5").unwrap(),
            Command::Model {
                row: 0,
                col: 3,
                value: 1.5
            }
        );
    }

    #[test]
    fn test_markers_and_reset() {
        assert_eq!(parse_command("markers on").unwrap(), Command::Markers(Some(true)));
        assert_eq!(parse_command("markers off").unwrap(), Command::Markers(Some(false)));
        assert_eq!(parse_command("markers").unwrap(), Command::Markers(None));
        assert_eq!(parse_command(":reset").unwrap(), Command::Reset);
    }

    #[test]
    fn test_rejects_garbage() {
        for line in ["", "eye 1 2", "fov", "fov sixty", "reset now", "zoom 2"] {
            assert!(
                matches!(parse_command(line), Err(VisualizerError::Command(_))),
                "{line:?} should not parse"
            );
        }
    }
}
