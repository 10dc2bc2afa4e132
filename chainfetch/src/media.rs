use nom::{
    bytes::complete::{tag, take_till, take_while, take_while1},
    character::complete::space0,
    IResult,
};

fn is_token_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || "!#$%&'*+-.^_`|~".contains(c)
}

fn parse_token(input: &str) -> IResult<&str, &str> {
    take_while1(is_token_char)(input)
}

fn parse_essence(input: &str) -> IResult<&str, (&str, &str)> {
    let (input, _) = space0(input)?;
    let (input, kind) = parse_token(input)?;
    let (input, _) = tag("/")(input)?;
    let (input, subtype) = parse_token(input)?;
    Ok((input, (kind, subtype)))
}

fn parse_quoted(input: &str) -> IResult<&str, &str> {
    let (input, _) = tag("\"")(input)?;
    let (input, value) = take_till(|c: char| c == '"')(input)?;
    let (input, _) = tag("\"")(input)?;
    Ok((input, value))
}

fn parse_parameter(input: &str) -> IResult<&str, (&str, &str)> {
    let (input, _) = space0(input)?;
    let (input, _) = tag(";")(input)?;
    let (input, _) = space0(input)?;
    let (input, name) = parse_token(input)?;
    let (input, _) = space0(input)?;
    let (input, _) = tag("=")(input)?;
    let (input, _) = space0(input)?;
    if let Ok((input, value)) = parse_quoted(input) {
        return Ok((input, (name, value)));
    }
    let (input, value) = take_while(is_token_char)(input)?;
    Ok((input, (name, value)))
}

/// A parsed `Content-Type` value such as `text/html; charset=gbk`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaType<'a> {
    pub kind: &'a str,
    pub subtype: &'a str,
    pub params: Vec<(&'a str, &'a str)>,
}

impl<'a> MediaType<'a> {
    /// Parses a header value. Parameters that fail to parse end the list
    /// instead of rejecting the whole value.
    pub fn parse(input: &'a str) -> Option<Self> {
        let (mut input, (kind, subtype)) = parse_essence(input).ok()?;
        let mut params = Vec::new();
        while let Ok((rest, param)) = parse_parameter(input) {
            params.push(param);
            input = rest;
        }
        Some(MediaType {
            kind,
            subtype,
            params,
        })
    }

    pub fn is(&self, kind: &str, subtype: &str) -> bool {
        self.kind.eq_ignore_ascii_case(kind) && self.subtype.eq_ignore_ascii_case(subtype)
    }

    /// `application/json` or any `application/*+json` type.
    pub fn is_json(&self) -> bool {
        self.kind.eq_ignore_ascii_case("application")
            && (self.subtype.eq_ignore_ascii_case("json")
                || self.subtype.to_ascii_lowercase().ends_with("+json"))
    }

    pub fn is_form(&self) -> bool {
        self.is("application", "x-www-form-urlencoded")
    }

    pub fn param(&self, name: &str) -> Option<&'a str> {
        self.params
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| *v)
    }

    pub fn charset(&self) -> Option<&'a str> {
        self.param("charset")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_essence() {
        let (input, output) = parse_essence("text/html; charset=utf-8").unwrap();
        assert_eq!(input, "; charset=utf-8");
        assert_eq!(output, ("text", "html"));
        assert!(parse_essence("text").is_err());
        assert!(parse_essence("/html").is_err());
    }

    #[test]
    fn test_parse_parameter() {
        let (input, output) = parse_parameter("; charset=gbk").unwrap();
        assert_eq!(input, "");
        assert_eq!(output, ("charset", "gbk"));
        let (_, output) = parse_parameter(";boundary=\"a b;c\"").unwrap();
        assert_eq!(output, ("boundary", "a b;c"));
        assert!(parse_parameter("charset=gbk").is_err());
    }

    #[test]
    fn test_media_type() {
        let media = MediaType::parse("Application/JSON; Charset=\"UTF-8\"").unwrap();
        assert!(media.is_json());
        assert!(!media.is_form());
        assert_eq!(media.charset(), Some("UTF-8"));

        let media = MediaType::parse("application/problem+json").unwrap();
        assert!(media.is_json());

        let media = MediaType::parse("application/x-www-form-urlencoded;charset=gbk;;").unwrap();
        assert!(media.is_form());
        assert_eq!(media.params, vec![("charset", "gbk")]);

        assert_eq!(MediaType::parse("not a media type"), None);
        assert_eq!(MediaType::parse(""), None);
    }
}
