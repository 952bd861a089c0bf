use chrono::{DateTime, Utc};
use mockall::mock;
use uuid::Uuid;

use crate::models::{DbAvailabilityBlock, DbAvailabilityRule, DbBooking, DbMeetingType, DbOwner, NewBooking};
use crate::repositories::booking::BookingInsert;
use slotwise_core::models::availability::AvailabilityRule;

// Mock repositories for testing
mock! {
    pub OwnerRepo {
        pub async fn get_owner_by_id(&self, id: Uuid) -> eyre::Result<Option<DbOwner>>;

        pub async fn get_owner_by_slug(&self, slug: String) -> eyre::Result<Option<DbOwner>>;
    }
}

mock! {
    pub MeetingTypeRepo {
        pub async fn get_meeting_type_by_slug(
            &self,
            owner_id: Uuid,
            slug: String,
        ) -> eyre::Result<Option<DbMeetingType>>;

        pub async fn get_meeting_type_by_id(
            &self,
            id: Uuid,
        ) -> eyre::Result<Option<DbMeetingType>>;
    }
}

mock! {
    pub AvailabilityRepo {
        pub async fn list_rules(&self, owner_id: Uuid) -> eyre::Result<Vec<DbAvailabilityRule>>;

        pub async fn replace_rules(
            &self,
            owner_id: Uuid,
            rules: Vec<AvailabilityRule>,
        ) -> eyre::Result<()>;

        pub async fn list_blocks_in_range(
            &self,
            owner_id: Uuid,
            from: DateTime<Utc>,
            to: DateTime<Utc>,
        ) -> eyre::Result<Vec<DbAvailabilityBlock>>;
    }
}

mock! {
    pub BookingRepo {
        pub async fn insert_booking(&self, booking: NewBooking) -> eyre::Result<BookingInsert>;

        pub async fn get_booking_by_id(&self, id: Uuid) -> eyre::Result<Option<DbBooking>>;

        pub async fn list_confirmed_in_range(
            &self,
            owner_id: Uuid,
            from: DateTime<Utc>,
            to: DateTime<Utc>,
        ) -> eyre::Result<Vec<DbBooking>>;

        pub async fn cancel_booking(
            &self,
            id: Uuid,
            cancelled_at: DateTime<Utc>,
        ) -> eyre::Result<DbBooking>;
    }
}
