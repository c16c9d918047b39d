//! Request body of `POST /api/reviews`.

use serde::Deserialize;

use pr_reviewer::model::{ChangeSource, ReviewConfig};

/// Exactly one change source must be present: `pr_url`, the
/// `(repository, pr_number)` pair, or `diff_content`. With `diff_content`,
/// `repository`/`pr_number` ride along as labels only.
#[derive(Debug, Deserialize)]
pub struct CreateReviewRequest {
    pub pr_url: Option<String>,
    pub repository: Option<String>,
    pub pr_number: Option<u64>,
    pub diff_content: Option<String>,
    pub access_token: Option<String>,
    pub config: Option<ReviewConfig>,
}

impl CreateReviewRequest {
    /// Validates the one-of-three rule and splits into pipeline inputs.
    pub fn into_parts(self) -> Result<(ChangeSource, ReviewConfig), String> {
        let url_selected = self.pr_url.is_some();
        let diff_selected = self.diff_content.is_some();
        let pair_selected =
            self.repository.is_some() && self.pr_number.is_some() && !diff_selected && !url_selected;

        let selected =
            usize::from(url_selected) + usize::from(diff_selected) + usize::from(pair_selected);
        if selected != 1 {
            return Err(
                "exactly one of pr_url, (repository & pr_number), or diff_content must be present"
                    .to_string(),
            );
        }
        if url_selected && (self.repository.is_some() || self.pr_number.is_some()) {
            return Err("pr_url cannot be combined with repository/pr_number".to_string());
        }

        let config = self.config.unwrap_or_default();
        let source = if diff_selected {
            ChangeSource::Manual {
                diff_text: self.diff_content.unwrap_or_default(),
                repository: self.repository,
                pr_number: self.pr_number,
            }
        } else {
            ChangeSource::Remote {
                url: self.pr_url,
                repository: self.repository,
                pr_number: self.pr_number,
                access_token: self.access_token,
            }
        };
        Ok((source, config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(json: &str) -> CreateReviewRequest {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn each_single_source_is_accepted() {
        for body in [
            r#"{"pr_url": "https://github.com/a/b/pull/1"}"#,
            r#"{"repository": "a/b", "pr_number": 1}"#,
            r#"{"diff_content": "diff --git a/x b/x"}"#,
            r#"{"diff_content": "diff --git a/x b/x", "repository": "a/b", "pr_number": 1}"#,
        ] {
            assert!(request(body).into_parts().is_ok(), "{body}");
        }
    }

    #[test]
    fn zero_or_multiple_sources_are_rejected() {
        for body in [
            r#"{}"#,
            r#"{"repository": "a/b"}"#,
            r#"{"pr_url": "https://github.com/a/b/pull/1", "diff_content": "x"}"#,
            r#"{"pr_url": "https://github.com/a/b/pull/1", "repository": "a/b", "pr_number": 1}"#,
        ] {
            assert!(request(body).into_parts().is_err(), "{body}");
        }
    }

    #[test]
    fn labels_travel_with_manual_diffs() {
        let (source, _) = request(
            r#"{"diff_content": "diff --git a/x b/x", "repository": "a/b", "pr_number": 9}"#,
        )
        .into_parts()
        .unwrap();
        match source {
            ChangeSource::Manual {
                repository,
                pr_number,
                ..
            } => {
                assert_eq!(repository.as_deref(), Some("a/b"));
                assert_eq!(pr_number, Some(9));
            }
            other => panic!("expected manual source, got {other:?}"),
        }
    }
}
