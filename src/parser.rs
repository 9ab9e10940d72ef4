// Copyright (C) 2025  Tom Waddington
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published
// by the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Script parser for dietcast files
//!
//! Parses scripts with the format:
//! - @ directives (speed, pause, jitter, title)
//! - # comments
//! - $ command lines, each followed by > output lines
//! - ! final panel sections, with | code lines for auto-fix blocks

use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::tag,
    character::complete::{char, not_line_ending, space0},
    combinator::{map, opt, value},
};

use crate::config::is_valid_delay;
use crate::error::ParseError;
use crate::types::{AnalysisPanel, Entry, PanelSection, Script, ScriptSettings};

#[derive(Debug, Clone, PartialEq)]
enum Directive {
    Speed(f64),
    Pause(f64),
    Jitter(f64),
    Title(String),
}

#[derive(Debug, Clone, PartialEq)]
enum Line {
    Directive(Directive),
    Command(String),
    Output(String),
    Panel(PanelSection),
    Code(String),
}

fn parse_float(input: &str) -> IResult<&str, f64> {
    nom::number::complete::double(input)
}

fn parse_speed(input: &str) -> IResult<&str, Directive> {
    let (input, _) = tag("@")(input)?;
    let (input, _) = space0(input)?;
    let (input, _) = tag("speed:")(input)?;
    let (input, value) = parse_float(input)?;
    Ok((input, Directive::Speed(value)))
}

fn parse_pause(input: &str) -> IResult<&str, Directive> {
    let (input, _) = tag("@")(input)?;
    let (input, _) = space0(input)?;
    let (input, _) = tag("pause:")(input)?;
    let (input, value) = parse_float(input)?;
    Ok((input, Directive::Pause(value)))
}

fn parse_jitter(input: &str) -> IResult<&str, Directive> {
    let (input, _) = tag("@")(input)?;
    let (input, _) = space0(input)?;
    let (input, _) = tag("jitter:")(input)?;
    let (input, value) = parse_float(input)?;
    Ok((input, Directive::Jitter(value)))
}

fn parse_title(input: &str) -> IResult<&str, Directive> {
    let (input, _) = tag("@")(input)?;
    let (input, _) = space0(input)?;
    let (input, _) = tag("title:")(input)?;
    let (input, title) = not_line_ending(input)?;
    Ok((input, Directive::Title(title.trim().to_string())))
}

fn parse_directive(input: &str) -> IResult<&str, Directive> {
    alt((parse_speed, parse_pause, parse_jitter, parse_title)).parse(input)
}

fn parse_comment(input: &str) -> IResult<&str, ()> {
    let (input, _) = char('#')(input)?;
    let (input, _) = not_line_ending(input)?;
    Ok((input, ()))
}

// Marker, one optional separating space, then the rest of the line verbatim
fn parse_marked<'a>(marker: char, input: &'a str) -> IResult<&'a str, String> {
    let (input, _) = char(marker)(input)?;
    let (input, _) = opt(char(' ')).parse(input)?;
    let (input, text) = not_line_ending(input)?;
    Ok((input, text.to_string()))
}

fn parse_command(input: &str) -> IResult<&str, Line> {
    let (input, text) = parse_marked('$', input)?;
    Ok((input, Line::Command(text.trim().to_string())))
}

fn parse_output(input: &str) -> IResult<&str, Line> {
    let (input, text) = parse_marked('>', input)?;
    Ok((input, Line::Output(text)))
}

fn parse_code(input: &str) -> IResult<&str, Line> {
    let (input, text) = parse_marked('|', input)?;
    Ok((input, Line::Code(text)))
}

fn parse_panel(input: &str) -> IResult<&str, Line> {
    let (input, _) = char('!')(input)?;
    let (input, _) = space0(input)?;
    let (input, kind) = alt((tag("warning:"), tag("suggestion:"), tag("autofix:"))).parse(input)?;
    let (input, text) = not_line_ending(input)?;
    let text = text.trim().to_string();

    let section = match kind {
        "warning:" => PanelSection::Warning(text),
        "suggestion:" => PanelSection::Suggestion(text),
        _ => PanelSection::AutoFix {
            path: text,
            code: Vec::new(),
        },
    };
    Ok((input, Line::Panel(section)))
}

fn parse_line(input: &str) -> IResult<&str, Option<Line>> {
    alt((
        map(parse_directive, |d| Some(Line::Directive(d))),
        value(None, parse_comment),
        map(parse_command, Some),
        map(parse_output, Some),
        map(parse_panel, Some),
        map(parse_code, Some),
    ))
    .parse(input)
}

fn check_duration(line: usize, name: &'static str, value: f64) -> Result<f64, ParseError> {
    if is_valid_delay(value) {
        Ok(value)
    } else {
        Err(ParseError::OutOfRange {
            line,
            name,
            expected: "between 0 and 3600 seconds",
            value,
        })
    }
}

fn apply_directive(
    settings: &mut ScriptSettings,
    line: usize,
    directive: Directive,
) -> Result<(), ParseError> {
    match directive {
        Directive::Speed(v) => settings.speed = Some(check_duration(line, "speed", v)?),
        Directive::Pause(v) => settings.pause = Some(check_duration(line, "pause", v)?),
        Directive::Jitter(v) => {
            if !(0.0..=1.0).contains(&v) {
                return Err(ParseError::OutOfRange {
                    line,
                    name: "jitter",
                    expected: "between 0.0 and 1.0",
                    value: v,
                });
            }
            settings.jitter = Some(v);
        }
        Directive::Title(title) => settings.title = Some(title),
    }
    Ok(())
}

pub fn parse_script(input: &str) -> Result<Script, ParseError> {
    let mut entries: Vec<Entry> = Vec::new();
    let mut panel = AnalysisPanel::default();
    let mut settings = ScriptSettings::default();

    for (line_num, raw) in input.lines().enumerate() {
        let line = line_num + 1;
        let trimmed = raw.trim();

        if trimmed.is_empty() {
            continue;
        }

        let parsed = match parse_line(trimmed) {
            Ok((remaining, parsed)) => {
                if !remaining.trim().is_empty() {
                    return Err(ParseError::UnexpectedText {
                        line,
                        text: remaining.to_string(),
                    });
                }
                parsed
            }
            Err(e) => {
                return Err(ParseError::Syntax {
                    line,
                    message: e.to_string(),
                });
            }
        };

        match parsed {
            None => {}
            Some(Line::Directive(directive)) => apply_directive(&mut settings, line, directive)?,
            Some(Line::Command(text)) => entries.push(Entry::new(text)),
            Some(Line::Output(text)) => entries
                .last_mut()
                .ok_or(ParseError::OrphanOutput { line })?
                .output_lines
                .push(text),
            Some(Line::Panel(section)) => panel.sections.push(section),
            Some(Line::Code(text)) => match panel.sections.last_mut() {
                Some(PanelSection::AutoFix { code, .. }) => code.push(text),
                _ => return Err(ParseError::OrphanCode { line }),
            },
        }
    }

    Ok(Script {
        entries,
        panel,
        settings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_speed() {
        let input = "@ speed:0.06";
        let result = parse_speed(input);
        assert!(result.is_ok());
        let (_, d) = result.unwrap();
        assert_eq!(d, Directive::Speed(0.06));
    }

    #[test]
    fn test_parse_pause() {
        let (_, d) = parse_pause("@pause:0.5").unwrap();
        assert_eq!(d, Directive::Pause(0.5));
    }

    #[test]
    fn test_parse_title() {
        let (_, d) = parse_title("@ title:  zsh — demo  ").unwrap();
        assert_eq!(d, Directive::Title("zsh — demo".to_string()));
    }

    #[test]
    fn test_parse_command_trims() {
        let (_, line) = parse_command("$   docker images ").unwrap();
        assert_eq!(line, Line::Command("docker images".to_string()));
    }

    #[test]
    fn test_parse_code_keeps_indentation() {
        let (_, line) = parse_code("|     libpq5 && rm -rf /var/lib/apt/lists/*").unwrap();
        assert_eq!(
            line,
            Line::Code("    libpq5 && rm -rf /var/lib/apt/lists/*".to_string())
        );
    }

    #[test]
    fn test_parse_script() {
        let input = r#"@ speed:0.05
@ pause:1.0
# This is a comment
$ container-diet analyze alpine
> Scanning image: alpine
>
> Total Size: 7.8 MB
$ echo done

! warning:Too many layers
! suggestion:Squash them
! autofix:Dockerfile.diet
| FROM alpine:3.20
|   RUN true
"#;
        let script = parse_script(input).unwrap();
        assert_eq!(script.len(), 2);
        assert_eq!(script.entries[0].display_text, "container-diet analyze alpine");
        assert_eq!(
            script.entries[0].output_lines,
            vec!["Scanning image: alpine", "", "Total Size: 7.8 MB"]
        );
        assert!(script.entries[1].output_lines.is_empty());
        assert_eq!(script.settings.speed, Some(0.05));
        assert_eq!(script.settings.pause, Some(1.0));
        assert_eq!(script.settings.jitter, None);
        assert_eq!(
            script.panel.sections,
            vec![
                PanelSection::Warning("Too many layers".to_string()),
                PanelSection::Suggestion("Squash them".to_string()),
                PanelSection::AutoFix {
                    path: "Dockerfile.diet".to_string(),
                    code: vec!["FROM alpine:3.20".to_string(), "  RUN true".to_string()],
                },
            ]
        );
    }

    #[test]
    fn test_output_before_command_is_rejected() {
        let err = parse_script("# intro\n> orphan").unwrap_err();
        assert_eq!(err, ParseError::OrphanOutput { line: 2 });
    }

    #[test]
    fn test_code_without_autofix_is_rejected() {
        let err = parse_script("! warning:heavy\n| FROM scratch").unwrap_err();
        assert_eq!(err, ParseError::OrphanCode { line: 2 });
    }

    #[test]
    fn test_trailing_text_after_directive() {
        let err = parse_script("@ speed:0.1 fast").unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedText { line: 1, .. }));
    }

    #[test]
    fn test_jitter_out_of_range() {
        let err = parse_script("@ jitter:1.5").unwrap_err();
        assert!(matches!(
            err,
            ParseError::OutOfRange {
                line: 1,
                name: "jitter",
                ..
            }
        ));
    }

    #[test]
    fn test_negative_speed_is_rejected() {
        let err = parse_script("$ ls\n@ speed:-1").unwrap_err();
        assert!(matches!(
            err,
            ParseError::OutOfRange {
                line: 2,
                name: "speed",
                ..
            }
        ));
    }

    #[test]
    fn test_huge_pause_is_rejected() {
        let err = parse_script("@ pause:1e300\n$ ls").unwrap_err();
        assert!(matches!(
            err,
            ParseError::OutOfRange {
                line: 1,
                name: "pause",
                ..
            }
        ));
        let err = parse_script("@ speed:3601").unwrap_err();
        assert!(matches!(err, ParseError::OutOfRange { name: "speed", .. }));
        assert!(parse_script("@ pause:3600").is_ok());
    }

    #[test]
    fn test_unknown_syntax() {
        let err = parse_script("$ ls\nls -la").unwrap_err();
        assert!(matches!(err, ParseError::Syntax { line: 2, .. }));
    }

    #[test]
    fn test_empty_script() {
        let script = parse_script("\n# nothing here\n").unwrap();
        assert!(script.is_empty());
        assert!(script.panel.is_empty());
    }
}
