/// Expand `${VAR}` and `${VAR:-fallback}` placeholders in raw config text.
///
/// Placeholders naming an unset variable without a fallback are kept verbatim
/// so the resulting value makes the missing variable obvious.
pub fn substitute_env(input: &str) -> String {
    substitute_env_with(input, |name| std::env::var(name).ok())
}

fn substitute_env_with(input: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            // Unterminated: copy the remainder untouched.
            out.push_str(&rest[start..]);
            return out;
        };

        let expr = &after[..end];
        let (name, fallback) = match expr.split_once(":-") {
            Some((name, fallback)) => (name, Some(fallback)),
            None => (expr, None),
        };

        match (name.is_empty(), lookup(name), fallback) {
            (false, Some(value), _) => out.push_str(&value),
            (false, None, Some(fallback)) => out.push_str(fallback),
            _ => {
                out.push_str("${");
                out.push_str(expr);
                out.push('}');
            },
        }
        rest = &after[end + 1..];
    }

    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(name: &str) -> Option<String> {
        match name {
            "PROMPTHUB_SKILLS" => Some("/srv/skills".to_string()),
            _ => None,
        }
    }

    #[test]
    fn expands_set_variable() {
        assert_eq!(
            substitute_env_with("install_dir = \"${PROMPTHUB_SKILLS}/repos\"", lookup),
            "install_dir = \"/srv/skills/repos\""
        );
    }

    #[test]
    fn unset_variable_uses_fallback() {
        assert_eq!(
            substitute_env_with("program = \"${PROMPTHUB_GIT:-git}\"", lookup),
            "program = \"git\""
        );
    }

    #[test]
    fn unset_variable_without_fallback_is_kept() {
        assert_eq!(substitute_env_with("${NOPE}", lookup), "${NOPE}");
        assert_eq!(substitute_env_with("${}", lookup), "${}");
    }

    #[test]
    fn unterminated_placeholder_is_literal() {
        assert_eq!(substitute_env_with("a ${PROMPTHUB_SKILLS", lookup), "a ${PROMPTHUB_SKILLS");
    }

    #[test]
    fn plain_text_passes_through() {
        assert_eq!(substitute_env("no placeholders here"), "no placeholders here");
    }
}
