pub mod graph_api;

use std::time::Duration;

use crate::config::GraphConfig;
use crate::error::PublishError;
use crate::scraper::fetch::Pause;

/// Processing state of a media container, from its `status_code` field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContainerStatus {
    Finished,
    InProgress,
    Error,
    Expired,
    Published,
    Other(String),
}

impl ContainerStatus {
    pub fn from_code(code: &str) -> Self {
        match code {
            "FINISHED" => ContainerStatus::Finished,
            "IN_PROGRESS" => ContainerStatus::InProgress,
            "ERROR" => ContainerStatus::Error,
            "EXPIRED" => ContainerStatus::Expired,
            "PUBLISHED" => ContainerStatus::Published,
            other => ContainerStatus::Other(other.to_string()),
        }
    }
}

/// The target platform's publish API: a container is created from a public
/// video URL, processed asynchronously, then confirmed.
#[allow(async_fn_in_trait)]
pub trait GraphApi: Pause {
    async fn create_container(&self, video_url: &str, caption: &str) -> Result<String, PublishError>;
    async fn container_status(&self, container_id: &str) -> Result<ContainerStatus, PublishError>;
    async fn publish_container(&self, container_id: &str) -> Result<String, PublishError>;
}

#[derive(Debug, Clone, Copy)]
pub struct PublishSchedule {
    pub initial_wait: Duration,
    pub poll_interval: Duration,
    pub max_polls: u32,
}

impl From<&GraphConfig> for PublishSchedule {
    fn from(config: &GraphConfig) -> Self {
        PublishSchedule {
            initial_wait: config.initial_wait,
            poll_interval: config.poll_interval,
            max_polls: config.max_polls,
        }
    }
}

/// Creates a container, waits for it to finish processing and publishes it.
/// Returns the published media id.
pub async fn publish_video<G: GraphApi>(
    api: &G,
    schedule: PublishSchedule,
    video_url: &str,
    caption: &str,
) -> Result<String, PublishError> {
    let container_id = api.create_container(video_url, caption).await?;
    tracing::info!(%container_id, "created media container");

    api.pause(schedule.initial_wait).await;

    let mut ready = false;
    for poll in 1..=schedule.max_polls {
        match api.container_status(&container_id).await {
            Ok(ContainerStatus::Finished) => {
                ready = true;
                break;
            }
            Ok(ContainerStatus::Error) | Ok(ContainerStatus::Expired) => {
                return Err(PublishError::Processing { container_id });
            }
            Ok(status) => tracing::debug!(%container_id, poll, ?status, "container not ready"),
            Err(e @ PublishError::Permission { .. }) => return Err(e),
            Err(e) => tracing::warn!(%container_id, poll, error = %e, "status check failed"),
        }

        if poll < schedule.max_polls {
            api.pause(schedule.poll_interval).await;
        }
    }

    if !ready {
        return Err(PublishError::NotReady {
            container_id,
            polls: schedule.max_polls,
        });
    }

    let media_id = api.publish_container(&container_id).await?;
    tracing::info!(%container_id, %media_id, "published media");
    Ok(media_id)
}

#[cfg(test)]
pub(crate) mod testing {
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::time::Duration;

    use super::{ContainerStatus, GraphApi};
    use crate::error::PublishError;
    use crate::scraper::fetch::Pause;

    /// Graph API double that replays status codes and records calls.
    #[derive(Default)]
    pub struct FakeGraph {
        pub statuses: RefCell<VecDeque<Result<ContainerStatus, PublishError>>>,
        pub created: RefCell<Vec<(String, String)>>,
        pub published: RefCell<Vec<String>>,
        pub pauses: RefCell<Vec<Duration>>,
        pub fail_create: bool,
    }

    impl FakeGraph {
        pub fn with_statuses(statuses: Vec<Result<ContainerStatus, PublishError>>) -> Self {
            FakeGraph {
                statuses: RefCell::new(statuses.into()),
                ..Default::default()
            }
        }
    }

    impl Pause for FakeGraph {
        async fn pause(&self, duration: Duration) {
            self.pauses.borrow_mut().push(duration);
        }
    }

    impl GraphApi for FakeGraph {
        async fn create_container(&self, video_url: &str, caption: &str) -> Result<String, PublishError> {
            if self.fail_create {
                return Err(PublishError::Permission {
                    code: Some(10),
                    message: "missing instagram_content_publish".into(),
                });
            }
            self.created
                .borrow_mut()
                .push((video_url.to_string(), caption.to_string()));
            Ok(format!("container-{}", self.created.borrow().len()))
        }

        async fn container_status(&self, _container_id: &str) -> Result<ContainerStatus, PublishError> {
            self.statuses
                .borrow_mut()
                .pop_front()
                .unwrap_or(Ok(ContainerStatus::InProgress))
        }

        async fn publish_container(&self, container_id: &str) -> Result<String, PublishError> {
            self.published.borrow_mut().push(container_id.to_string());
            Ok(format!("media-of-{container_id}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;

    use super::testing::FakeGraph;
    use super::*;

    fn schedule() -> PublishSchedule {
        PublishSchedule {
            initial_wait: Duration::from_secs(10),
            poll_interval: Duration::from_secs(5),
            max_polls: 4,
        }
    }

    #[test]
    fn publishes_once_finished() {
        let api = FakeGraph::with_statuses(vec![
            Ok(ContainerStatus::InProgress),
            Err(PublishError::Request("flaky".into())),
            Ok(ContainerStatus::Finished),
        ]);
        let id = block_on(publish_video(&api, schedule(), "https://cdn/v.mp4", "hello")).unwrap();

        assert_eq!(id, "media-of-container-1");
        assert_eq!(api.created.borrow()[0], ("https://cdn/v.mp4".to_string(), "hello".to_string()));
        assert_eq!(api.published.borrow().as_slice(), ["container-1"]);
        assert_eq!(
            api.pauses.borrow().as_slice(),
            [Duration::from_secs(10), Duration::from_secs(5), Duration::from_secs(5)]
        );
    }

    #[test]
    fn processing_error_stops_without_publishing() {
        let api = FakeGraph::with_statuses(vec![Ok(ContainerStatus::Error)]);
        let err = block_on(publish_video(&api, schedule(), "https://cdn/v.mp4", "c")).unwrap_err();
        assert!(matches!(err, PublishError::Processing { .. }));
        assert!(api.published.borrow().is_empty());
    }

    #[test]
    fn never_ready_is_not_published() {
        let api = FakeGraph::default();
        let err = block_on(publish_video(&api, schedule(), "https://cdn/v.mp4", "c")).unwrap_err();
        assert!(matches!(err, PublishError::NotReady { polls: 4, .. }));
        assert!(api.published.borrow().is_empty());
        // initial wait plus three gaps between four polls
        assert_eq!(api.pauses.borrow().len(), 4);
    }

    #[test]
    fn permission_error_surfaces_immediately() {
        let api = FakeGraph {
            fail_create: true,
            ..Default::default()
        };
        let err = block_on(publish_video(&api, schedule(), "https://cdn/v.mp4", "c")).unwrap_err();
        assert!(matches!(err, PublishError::Permission { code: Some(10), .. }));
        assert!(api.pauses.borrow().is_empty());
    }

    #[test]
    fn status_codes_parse() {
        assert_eq!(ContainerStatus::from_code("FINISHED"), ContainerStatus::Finished);
        assert_eq!(ContainerStatus::from_code("IN_PROGRESS"), ContainerStatus::InProgress);
        assert_eq!(
            ContainerStatus::from_code("WEIRD"),
            ContainerStatus::Other("WEIRD".into())
        );
    }
}
