mod follow_repository;
mod like_repository;
mod notification_repository;
mod profile_repository;
mod social_graph;

pub use follow_repository::FollowRepository;
pub use like_repository::LikeRepository;
pub use notification_repository::NotificationRepository;
pub use profile_repository::ProfileRepository;
pub use social_graph::SocialGraph;
