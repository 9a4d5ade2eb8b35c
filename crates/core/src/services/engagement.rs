//! Likes and comments on images.
//!
//! Likes are keyed by a client-generated voter token. The token is not
//! authenticated: anyone can send any token, and a client that forgets its
//! token can like again.

use chrono::Utc;
use memento_common::{AppError, AppResult, IdGenerator};
use memento_db::{
    entities::{comment, image_like},
    repositories::{CommentRepository, LikeRepository},
};
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Maximum voter token length.
const MAX_VOTER_TOKEN_LENGTH: usize = 128;

/// Maximum commenter name length, in characters.
const MAX_COMMENTER_NAME_LENGTH: usize = 100;

/// Input for posting a comment.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CommentInput {
    /// Author name. Ignored when anonymous, checked in
    /// [`EngagementService::add_comment`] otherwise.
    #[serde(default)]
    pub name: Option<String>,
    #[validate(length(max = 2000))]
    pub text: String,
    #[serde(default)]
    pub is_anonymous: bool,
}

/// Like state of one image as seen by one client session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeState {
    pub image_id: String,
    pub likes: u64,
    pub has_liked: bool,
}

impl LikeState {
    /// State for an image the session has not touched.
    #[must_use]
    pub fn new(image_id: impl Into<String>, likes: u64) -> Self {
        Self {
            image_id: image_id.into(),
            likes,
            has_liked: false,
        }
    }
}

/// Service for likes and comments.
#[derive(Clone)]
pub struct EngagementService {
    comment_repo: CommentRepository,
    like_repo: LikeRepository,
    id_gen: IdGenerator,
}

impl EngagementService {
    /// Create a new engagement service.
    #[must_use]
    pub const fn new(comment_repo: CommentRepository, like_repo: LikeRepository) -> Self {
        Self {
            comment_repo,
            like_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Number of likes on an image.
    pub async fn like_count(&self, image_id: &str) -> AppResult<u64> {
        self.like_repo.count_by_image(image_id).await
    }

    /// Load the like state of an image for a voter.
    pub async fn like_state(&self, image_id: &str, voter_token: &str) -> AppResult<LikeState> {
        check_voter_token(voter_token)?;
        let likes = self.like_repo.count_by_image(image_id).await?;
        let has_liked = self.like_repo.exists(image_id, voter_token).await?;
        Ok(LikeState {
            image_id: image_id.to_string(),
            likes,
            has_liked,
        })
    }

    /// Record a like. A repeated like is [`AppError::Conflict`].
    pub async fn like(&self, image_id: &str, voter_token: &str) -> AppResult<()> {
        check_voter_token(voter_token)?;

        self.like_repo
            .create(image_like::ActiveModel {
                id: Set(self.id_gen.generate()),
                image_id: Set(image_id.to_string()),
                voter_token: Set(voter_token.to_string()),
                created_at: Set(Utc::now().into()),
            })
            .await?;

        tracing::debug!(image_id = %image_id, "Image liked");
        Ok(())
    }

    /// Remove a like. Returns whether one was removed.
    pub async fn unlike(&self, image_id: &str, voter_token: &str) -> AppResult<bool> {
        check_voter_token(voter_token)?;

        let removed = self.like_repo.delete_by_voter(image_id, voter_token).await?;
        tracing::debug!(image_id = %image_id, removed, "Image unliked");
        Ok(removed > 0)
    }

    /// Flip the session's like on an image and adjust its count.
    ///
    /// The state held by the session decides the direction; the database is
    /// not consulted first. The count never drops below zero. A like the
    /// database already has is taken as liked without counting it twice.
    pub async fn toggle_like(&self, state: &mut LikeState, voter_token: &str) -> AppResult<()> {
        if state.has_liked {
            self.unlike(&state.image_id, voter_token).await?;
            state.likes = state.likes.saturating_sub(1);
            state.has_liked = false;
            return Ok(());
        }

        match self.like(&state.image_id, voter_token).await {
            Ok(()) => {
                state.likes += 1;
                state.has_liked = true;
                Ok(())
            }
            Err(AppError::Conflict(_)) => {
                state.has_liked = true;
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Post a comment.
    ///
    /// The text is required. A name is required unless the comment is
    /// anonymous, in which case the stored name is always
    /// [`comment::ANONYMOUS_NAME`].
    pub async fn add_comment(
        &self,
        image_id: &str,
        input: CommentInput,
    ) -> AppResult<comment::Model> {
        input
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let text = input.text.trim();
        if text.is_empty() {
            return Err(AppError::Validation(
                "Comment text is required".to_string(),
            ));
        }

        let commenter_name = if input.is_anonymous {
            comment::ANONYMOUS_NAME.to_string()
        } else {
            match input.name.as_deref().map(str::trim) {
                Some(name) if name.chars().count() > MAX_COMMENTER_NAME_LENGTH => {
                    return Err(AppError::Validation(format!(
                        "Name must be at most {MAX_COMMENTER_NAME_LENGTH} characters"
                    )));
                }
                Some(name) if !name.is_empty() => name.to_string(),
                _ => {
                    return Err(AppError::Validation(
                        "Name is required unless posting anonymously".to_string(),
                    ));
                }
            }
        };

        let model = comment::ActiveModel {
            id: Set(self.id_gen.generate()),
            image_id: Set(image_id.to_string()),
            commenter_name: Set(commenter_name),
            comment_text: Set(text.to_string()),
            is_anonymous: Set(input.is_anonymous),
            created_at: Set(Utc::now().into()),
        };

        let comment = self.comment_repo.create(model).await?;
        tracing::debug!(image_id = %image_id, comment_id = %comment.id, "Comment added");
        Ok(comment)
    }

    /// Comments on an image, newest first.
    pub async fn list_comments(&self, image_id: &str) -> AppResult<Vec<comment::Model>> {
        self.comment_repo.find_by_image(image_id).await
    }
}

fn check_voter_token(token: &str) -> AppResult<()> {
    if token.trim().is_empty() {
        return Err(AppError::Validation("Voter token is required".to_string()));
    }
    if token.len() > MAX_VOTER_TOKEN_LENGTH {
        return Err(AppError::Validation(format!(
            "Voter token must be at most {MAX_VOTER_TOKEN_LENGTH} characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, DbErr, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn service(db: MockDatabase) -> EngagementService {
        let db = Arc::new(db.into_connection());
        EngagementService::new(CommentRepository::new(db.clone()), LikeRepository::new(db))
    }

    fn like_row() -> image_like::Model {
        image_like::Model {
            id: "l1".to_string(),
            image_id: "i".to_string(),
            voter_token: "tok".to_string(),
            created_at: Utc::now().into(),
        }
    }

    fn comment_row(name: &str, anonymous: bool) -> comment::Model {
        comment::Model {
            id: "c1".to_string(),
            image_id: "i".to_string(),
            commenter_name: name.to_string(),
            comment_text: "lovely".to_string(),
            is_anonymous: anonymous,
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_toggle_like_round_trip() {
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[like_row()]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }]),
        );
        let mut state = LikeState::new("i", 4);

        svc.toggle_like(&mut state, "tok").await.unwrap();
        assert_eq!(state.likes, 5);
        assert!(state.has_liked);

        svc.toggle_like(&mut state, "tok").await.unwrap();
        assert_eq!(state.likes, 4);
        assert!(!state.has_liked);
    }

    #[tokio::test]
    async fn test_unlike_never_goes_below_zero() {
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres).append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }]),
        );
        let mut state = LikeState {
            image_id: "i".to_string(),
            likes: 0,
            has_liked: true,
        };

        svc.toggle_like(&mut state, "tok").await.unwrap();

        assert_eq!(state.likes, 0);
        assert!(!state.has_liked);
    }

    #[tokio::test]
    async fn test_failed_like_leaves_state_untouched() {
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_errors([DbErr::Custom("down".to_string())]),
        );
        let mut state = LikeState::new("i", 2);

        let result = svc.toggle_like(&mut state, "tok").await;

        assert!(matches!(result, Err(AppError::Database(_))));
        assert_eq!(state, LikeState::new("i", 2));
    }

    #[tokio::test]
    async fn test_blank_voter_token_rejected() {
        let svc = service(MockDatabase::new(DatabaseBackend::Postgres));

        let result = svc.like("i", "  ").await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_like_state_loads_count_and_membership() {
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres).append_query_results([
                [maplit::btreemap! { "num_items" => sea_orm::Value::BigInt(Some(3)) }],
                [maplit::btreemap! { "num_items" => sea_orm::Value::BigInt(Some(1)) }],
            ]),
        );

        let state = svc.like_state("i", "tok").await.unwrap();

        assert_eq!(
            state,
            LikeState {
                image_id: "i".to_string(),
                likes: 3,
                has_liked: true,
            }
        );
    }

    #[tokio::test]
    async fn test_anonymous_comment_uses_sentinel_name() {
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[comment_row(comment::ANONYMOUS_NAME, true)]]),
        );

        let comment = svc
            .add_comment(
                "i",
                CommentInput {
                    name: Some("Ana".to_string()),
                    text: "lovely".to_string(),
                    is_anonymous: true,
                },
            )
            .await
            .unwrap();

        assert_eq!(comment.commenter_name, comment::ANONYMOUS_NAME);
        assert!(comment.is_anonymous);
    }

    #[tokio::test]
    async fn test_comment_requires_text_and_name() {
        let svc = service(MockDatabase::new(DatabaseBackend::Postgres));

        let blank_text = svc
            .add_comment(
                "i",
                CommentInput {
                    name: Some("Ana".to_string()),
                    text: "   ".to_string(),
                    is_anonymous: false,
                },
            )
            .await;
        let missing_name = svc
            .add_comment(
                "i",
                CommentInput {
                    name: None,
                    text: "hi".to_string(),
                    is_anonymous: false,
                },
            )
            .await;

        assert!(matches!(blank_text, Err(AppError::Validation(_))));
        assert!(matches!(missing_name, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_comment_name_length_only_checked_when_named() {
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[comment_row(comment::ANONYMOUS_NAME, true)]]),
        );
        let long_name = "n".repeat(101);

        let named = svc
            .add_comment(
                "i",
                CommentInput {
                    name: Some(long_name.clone()),
                    text: "hi".to_string(),
                    is_anonymous: false,
                },
            )
            .await;
        let anonymous = svc
            .add_comment(
                "i",
                CommentInput {
                    name: Some(long_name),
                    text: "hi".to_string(),
                    is_anonymous: true,
                },
            )
            .await
            .unwrap();

        assert!(matches!(named, Err(AppError::Validation(msg)) if msg.contains("100")));
        assert_eq!(anonymous.commenter_name, comment::ANONYMOUS_NAME);
    }

    #[tokio::test]
    async fn test_comment_text_length_limit() {
        let svc = service(MockDatabase::new(DatabaseBackend::Postgres));

        let result = svc
            .add_comment(
                "i",
                CommentInput {
                    name: None,
                    text: "x".repeat(2001),
                    is_anonymous: true,
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
