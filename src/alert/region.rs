//! Region filter: picks the registry rows an alert should reach.
//!
//! This is a substring match on the address column, not a geographic lookup.

use tracing::{info, warn};

use super::model::DisasterAlert;
use crate::store::{User, UserStore};

/// Region words meaning "the whole area".
const GLOBAL_MARKERS: &[&str] = &["전체", "전국"];

/// Derive the address keyword from a reception-region string.
///
/// - empty / whitespace-only → `None`
/// - contains a comma → first token of the first comma-separated segment
/// - several tokens → last token, or the first when a global marker appears
/// - one token → the string verbatim
pub fn region_keyword(region: &str) -> Option<String> {
    if region.trim().is_empty() {
        return None;
    }

    if region.contains(',') {
        return region
            .split(',')
            .flat_map(str::split_whitespace)
            .next()
            .map(str::to_string);
    }

    let parts: Vec<&str> = region.split_whitespace().collect();
    if parts.len() > 1 {
        let is_global = GLOBAL_MARKERS.iter().any(|m| region.contains(m));
        let keyword = if is_global { parts[0] } else { parts[parts.len() - 1] };
        return Some(keyword.to_string());
    }

    Some(region.to_string())
}

/// Select the users to notify for an alert.
///
/// A missing keyword or a store failure yields an empty set; neither aborts
/// the simulation.
pub async fn filter_target_users(alert: &DisasterAlert, store: &dyn UserStore) -> Vec<User> {
    let Some(keyword) = region_keyword(&alert.region) else {
        info!(region = %alert.region, "No location keyword to filter by");
        return Vec::new();
    };

    match store.find_users_by_address(&keyword).await {
        Ok(users) => {
            info!(keyword = %keyword, count = users.len(), "Filtered users to notify");
            users
        }
        Err(e) => {
            warn!(keyword = %keyword, error = %e, "User filtering failed");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::model::sample_alert;
    use crate::error::DatabaseError;
    use crate::store::{NewUser, Registry};
    use async_trait::async_trait;

    #[test]
    fn last_token_for_city_and_district() {
        assert_eq!(region_keyword("서울특별시 강남구").as_deref(), Some("강남구"));
        assert_eq!(region_keyword("경기도 성남시 분당구").as_deref(), Some("분당구"));
    }

    #[test]
    fn global_marker_takes_first_token() {
        assert_eq!(region_keyword("전국 지역").as_deref(), Some("전국"));
        assert_eq!(region_keyword("서울특별시 전체").as_deref(), Some("서울특별시"));
    }

    #[test]
    fn comma_takes_first_region() {
        assert_eq!(region_keyword("서울,경기").as_deref(), Some("서울"));
        assert_eq!(region_keyword("서울특별시 강남구, 서초구").as_deref(), Some("서울특별시"));
        assert_eq!(region_keyword("서울, 경기").as_deref(), Some("서울"));
    }

    #[test]
    fn comma_wins_over_global_marker() {
        assert_eq!(region_keyword("경기도 전체,서울특별시 강남구").as_deref(), Some("경기도"));
    }

    #[test]
    fn single_token_is_verbatim() {
        assert_eq!(region_keyword("강남구").as_deref(), Some("강남구"));
    }

    #[test]
    fn empty_region_has_no_keyword() {
        assert_eq!(region_keyword(""), None);
        assert_eq!(region_keyword("   "), None);
        assert_eq!(region_keyword(" , "), None);
    }

    #[tokio::test]
    async fn only_matching_addresses_are_selected() {
        let dir = tempfile::tempdir().unwrap();
        let registry = Registry::open(&dir.path().join("users.db")).await.unwrap();
        let session = registry.session().unwrap();
        session
            .insert_user(&NewUser::new("고령자", "서울 강남구 테헤란로 1", "+821000000101"))
            .await
            .unwrap();
        session
            .insert_user(&NewUser::new("고령자", "부산 해운대구 해운대로 2", "+821000000102"))
            .await
            .unwrap();

        let users = filter_target_users(&sample_alert("서울특별시 강남구"), &session).await;
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].phone_number, "+821000000101");

        let none = filter_target_users(&sample_alert(""), &session).await;
        assert!(none.is_empty());
    }

    struct FailingStore;

    #[async_trait]
    impl UserStore for FailingStore {
        async fn insert_user(&self, _user: &NewUser) -> Result<User, DatabaseError> {
            unimplemented!("not used in filter tests")
        }
        async fn get_user_by_phone(&self, _phone: &str) -> Result<Option<User>, DatabaseError> {
            unimplemented!("not used in filter tests")
        }
        async fn list_users(&self, _skip: u32, _limit: u32) -> Result<Vec<User>, DatabaseError> {
            unimplemented!("not used in filter tests")
        }
        async fn find_users_by_address(&self, _keyword: &str) -> Result<Vec<User>, DatabaseError> {
            Err(DatabaseError::Query("disk I/O error".into()))
        }
    }

    #[tokio::test]
    async fn store_failure_yields_empty_set() {
        let users = filter_target_users(&sample_alert("서울특별시 강남구"), &FailingStore).await;
        assert!(users.is_empty());
    }
}
