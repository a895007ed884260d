use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use rstest::rstest;
use sqlx::SqlitePool;

use super::*;
use crate::{
    complaints::sqlite::SqliteComplaintStore,
    db,
    roles::{Faculty, Role},
    users::{self, NewUser, UserUpdate},
};

struct Fixture {
    db_pool: SqlitePool,
    service: ComplaintService,
}

impl Fixture {
    async fn new() -> Self {
        let db_pool = db::memory_pool().await.unwrap();
        let store = Arc::new(SqliteComplaintStore::new(db_pool.clone()));
        Self {
            service: ComplaintService::new(store, Duration::from_secs(10)),
            db_pool,
        }
    }

    async fn user(&self, name: &str, role: Role) -> User {
        users::insert(
            &self.db_pool,
            &NewUser {
                name: name.to_owned(),
                email: format!("{}@luct.ac.ls", name.to_lowercase().replace(' ', ".")),
                password_hash: "unused".to_owned(),
                role,
                faculty: Faculty::Fict,
            },
        )
        .await
        .unwrap()
    }
}

#[tokio::test]
async fn student_files_against_lecturer() {
    let fx = Fixture::new().await;
    let student = fx.user("Lerato", Role::Student).await;
    let lecturer = fx.user("Mr Mokoena", Role::Lecturer).await;

    let complaint = fx
        .service
        .create(&student, lecturer.id, "Missed three classes")
        .await
        .unwrap();

    assert_eq!(complaint.status, ComplaintStatus::Pending);
    assert_eq!(complaint.complainant, PartySnapshot::from(&student));
    assert_eq!(complaint.against, PartySnapshot::from(&lecturer));
    assert_eq!(complaint.text, "Missed three classes");
    assert_eq!(complaint.faculty, Faculty::Fict);
    assert_eq!(complaint.reply, None);
}

#[rstest]
#[case(Role::Student, Role::Lecturer)]
#[case(Role::Lecturer, Role::Prl)]
#[case(Role::Prl, Role::Pl)]
#[case(Role::Pl, Role::Fmg)]
#[tokio::test]
async fn every_chain_edge_can_be_filed(#[case] from: Role, #[case] against: Role) {
    let fx = Fixture::new().await;
    let complainant = fx.user("Complainant", from).await;
    let target = fx.user("Target", against).await;

    let complaint = fx.service.create(&complainant, target.id, "text").await.unwrap();
    assert_eq!(complaint.status, ComplaintStatus::Pending);
    assert_eq!(complaint.complainant.role, from);
    assert_eq!(complaint.against.role, against);
}

#[rstest]
#[case(Role::Student, Role::Prl)]
#[case(Role::Student, Role::Student)]
#[case(Role::Lecturer, Role::Student)]
#[case(Role::Prl, Role::Fmg)]
#[case(Role::Pl, Role::Prl)]
#[case(Role::Fmg, Role::Pl)]
#[case(Role::Fmg, Role::Fmg)]
#[tokio::test]
async fn edges_outside_the_chain_are_role_mismatches(#[case] from: Role, #[case] against: Role) {
    let fx = Fixture::new().await;
    let complainant = fx.user("Complainant", from).await;
    let target = fx.user("Target", against).await;

    let err = fx.service.create(&complainant, target.id, "text").await.unwrap_err();
    assert!(matches!(err, ComplaintError::RoleMismatch { .. }), "{err:?}");
    assert!(fx.service.list_filed_by(complainant.id).await.unwrap().is_empty());
}

#[rstest]
#[case(Role::Student)]
#[case(Role::Lecturer)]
#[case(Role::Prl)]
#[case(Role::Pl)]
#[case(Role::Fmg)]
#[tokio::test]
async fn nobody_can_complain_about_themself(#[case] role: Role) {
    let fx = Fixture::new().await;
    let user = fx.user("Self", role).await;

    let err = fx.service.create(&user, user.id, "text").await.unwrap_err();
    assert!(matches!(err, ComplaintError::SelfComplaint), "{err:?}");
}

#[tokio::test]
async fn unknown_target_is_reported() {
    let fx = Fixture::new().await;
    let student = fx.user("Student", Role::Student).await;

    let err = fx.service.create(&student, 404, "text").await.unwrap_err();
    assert!(matches!(err, ComplaintError::TargetNotFound(404)));
}

#[rstest]
#[case("")]
#[case("   ")]
#[tokio::test]
async fn blank_complaint_text_is_rejected(#[case] text: &str) {
    let fx = Fixture::new().await;
    let student = fx.user("Student", Role::Student).await;
    let lecturer = fx.user("Lecturer", Role::Lecturer).await;

    let err = fx.service.create(&student, lecturer.id, text).await.unwrap_err();
    assert!(matches!(err, ComplaintError::Validation(_)));
}

#[tokio::test]
async fn target_response_moves_complaint_to_reviewed() {
    let fx = Fixture::new().await;
    let student = fx.user("Student", Role::Student).await;
    let lecturer = fx.user("Lecturer", Role::Lecturer).await;
    let filed = fx
        .service
        .create(&student, lecturer.id, "Missed three classes")
        .await
        .unwrap();

    let reviewed = fx
        .service
        .respond(filed.id, &lecturer, "Noted, will address next week")
        .await
        .unwrap();

    assert_eq!(reviewed.id, filed.id);
    assert_eq!(reviewed.status, ComplaintStatus::Reviewed);
    assert_eq!(
        reviewed.reply.as_ref().map(|reply| (reply.text.as_str(), reply.responded_by)),
        Some(("Noted, will address next week", lecturer.id))
    );

    let against = fx.service.list_against(lecturer.id).await.unwrap();
    assert_eq!(against, vec![reviewed]);
}

#[tokio::test]
async fn responding_to_a_missing_complaint_changes_nothing() {
    let fx = Fixture::new().await;
    let student = fx.user("Student", Role::Student).await;
    let lecturer = fx.user("Lecturer", Role::Lecturer).await;
    let filed = fx.service.create(&student, lecturer.id, "text").await.unwrap();

    let err = fx.service.respond(filed.id + 1, &lecturer, "reply").await.unwrap_err();
    assert!(matches!(err, ComplaintError::NotFound(_)));
    assert_eq!(fx.service.list_against(lecturer.id).await.unwrap(), vec![filed]);
}

#[tokio::test]
async fn only_the_target_may_respond() {
    let fx = Fixture::new().await;
    let student = fx.user("Student", Role::Student).await;
    let lecturer = fx.user("Lecturer", Role::Lecturer).await;
    let other = fx.user("Other Lecturer", Role::Lecturer).await;
    let filed = fx.service.create(&student, lecturer.id, "text").await.unwrap();

    for responder in [&student, &other] {
        let err = fx.service.respond(filed.id, responder, "reply").await.unwrap_err();
        assert!(matches!(err, ComplaintError::NotComplaintTarget));
    }
    assert_eq!(fx.service.list_filed_by(student.id).await.unwrap(), vec![filed]);
}

#[tokio::test]
async fn second_response_is_rejected_and_first_kept() {
    let fx = Fixture::new().await;
    let student = fx.user("Student", Role::Student).await;
    let lecturer = fx.user("Lecturer", Role::Lecturer).await;
    let filed = fx.service.create(&student, lecturer.id, "text").await.unwrap();

    let first = fx.service.respond(filed.id, &lecturer, "first").await.unwrap();
    let err = fx.service.respond(filed.id, &lecturer, "second").await.unwrap_err();

    assert!(matches!(err, ComplaintError::AlreadyResponded(id) if id == filed.id));
    assert_eq!(fx.service.list_against(lecturer.id).await.unwrap(), vec![first]);
}

#[tokio::test]
async fn blank_response_is_rejected() {
    let fx = Fixture::new().await;
    let student = fx.user("Student", Role::Student).await;
    let lecturer = fx.user("Lecturer", Role::Lecturer).await;
    let filed = fx.service.create(&student, lecturer.id, "text").await.unwrap();

    let err = fx.service.respond(filed.id, &lecturer, " ").await.unwrap_err();
    assert!(matches!(err, ComplaintError::Validation(_)));
}

#[tokio::test]
async fn complainant_resolves_a_reviewed_complaint() {
    let fx = Fixture::new().await;
    let student = fx.user("Student", Role::Student).await;
    let lecturer = fx.user("Lecturer", Role::Lecturer).await;
    let filed = fx.service.create(&student, lecturer.id, "text").await.unwrap();

    let err = fx.service.resolve(filed.id, &student).await.unwrap_err();
    assert!(matches!(
        err,
        ComplaintError::InvalidTransition { status: ComplaintStatus::Pending, .. }
    ));

    fx.service.respond(filed.id, &lecturer, "sorted").await.unwrap();

    let err = fx.service.resolve(filed.id, &lecturer).await.unwrap_err();
    assert!(matches!(err, ComplaintError::NotComplainant));

    let resolved = fx.service.resolve(filed.id, &student).await.unwrap();
    assert_eq!(resolved.status, ComplaintStatus::Resolved);
    assert_eq!(resolved.reply.map(|reply| reply.text), Some("sorted".to_owned()));

    let err = fx.service.resolve(filed.id, &student).await.unwrap_err();
    assert!(matches!(
        err,
        ComplaintError::InvalidTransition { status: ComplaintStatus::Resolved, .. }
    ));
}

#[tokio::test]
async fn listings_are_exact_disjoint_and_newest_first() {
    let fx = Fixture::new().await;
    let student = fx.user("Student", Role::Student).await;
    let lecturer = fx.user("Lecturer", Role::Lecturer).await;
    let prl = fx.user("Prl", Role::Prl).await;
    let other_student = fx.user("Other Student", Role::Student).await;

    let first = fx.service.create(&student, lecturer.id, "one").await.unwrap();
    let second = fx.service.create(&other_student, lecturer.id, "two").await.unwrap();
    let third = fx.service.create(&lecturer, prl.id, "three").await.unwrap();
    let fourth = fx.service.create(&student, lecturer.id, "four").await.unwrap();

    let against_lecturer = fx.service.list_against(lecturer.id).await.unwrap();
    assert_eq!(against_lecturer, vec![fourth.clone(), second, first.clone()]);

    let filed_by_lecturer = fx.service.list_filed_by(lecturer.id).await.unwrap();
    assert_eq!(filed_by_lecturer, vec![third]);
    assert!(
        filed_by_lecturer
            .iter()
            .all(|c| ComplaintFilter::FiledBy(lecturer.id).matches(c))
    );
    assert!(
        against_lecturer
            .iter()
            .all(|c| !filed_by_lecturer.contains(c))
    );

    assert_eq!(
        fx.service.list_filed_by(student.id).await.unwrap(),
        vec![fourth, first]
    );
    assert!(fx.service.list_against(student.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn snapshot_survives_later_user_changes() {
    let fx = Fixture::new().await;
    let student = fx.user("Student", Role::Student).await;
    let lecturer = fx.user("Mr Mokoena", Role::Lecturer).await;
    let filed = fx.service.create(&student, lecturer.id, "text").await.unwrap();

    users::update(
        &fx.db_pool,
        lecturer.id,
        &UserUpdate {
            name: Some("Dr Mokoena".to_owned()),
            role: Some(Role::Prl),
            faculty: None,
        },
    )
    .await
    .unwrap();

    let listed = fx.service.list_filed_by(student.id).await.unwrap();
    assert_eq!(listed, vec![filed]);
    assert_eq!(listed[0].against.name, "Mr Mokoena");
    assert_eq!(listed[0].against.role, Role::Lecturer);
}

#[tokio::test]
async fn closed_pool_surfaces_storage_unavailable() {
    let fx = Fixture::new().await;
    let student = fx.user("Student", Role::Student).await;
    fx.db_pool.close().await;

    let err = fx.service.create(&student, 2, "text").await.unwrap_err();
    assert!(matches!(err, ComplaintError::StorageUnavailable(_)), "{err:?}");
}

/// Never answers, like a store behind a hung connection.
struct StalledStore;

#[async_trait]
impl ComplaintStore for StalledStore {
    async fn find_user(&self, _: UserId) -> Result<Option<User>, StoreError> {
        std::future::pending().await
    }

    async fn insert_complaint(&self, _: NewComplaint) -> Result<Complaint, StoreError> {
        std::future::pending().await
    }

    async fn find_complaint(&self, _: ComplaintId) -> Result<Option<Complaint>, StoreError> {
        std::future::pending().await
    }

    async fn record_response(
        &self,
        _: ComplaintId,
        _: &str,
        _: UserId,
    ) -> Result<Option<Complaint>, StoreError> {
        std::future::pending().await
    }

    async fn mark_resolved(&self, _: ComplaintId) -> Result<Option<Complaint>, StoreError> {
        std::future::pending().await
    }

    async fn select_complaints(&self, _: ComplaintFilter) -> Result<Vec<Complaint>, StoreError> {
        std::future::pending().await
    }
}

#[tokio::test]
async fn stalled_store_times_out() {
    let timeout = Duration::from_millis(20);
    let service = ComplaintService::new(Arc::new(StalledStore), timeout);

    let err = service.list_against(1).await.unwrap_err();
    assert!(matches!(err, ComplaintError::Timeout(t) if t == timeout));

    let fx = Fixture::new().await;
    let lecturer = fx.user("Lecturer", Role::Lecturer).await;
    let err = service.respond(1, &lecturer, "reply").await.unwrap_err();
    assert!(matches!(err, ComplaintError::Timeout(_)));
}

/// Lets another caller resolve the complaint between the service's read and
/// its own update, so the conditional update matches nothing.
struct ResolvedElsewhere(SqliteComplaintStore);

#[async_trait]
impl ComplaintStore for ResolvedElsewhere {
    async fn find_user(&self, id: UserId) -> Result<Option<User>, StoreError> {
        self.0.find_user(id).await
    }

    async fn insert_complaint(&self, complaint: NewComplaint) -> Result<Complaint, StoreError> {
        self.0.insert_complaint(complaint).await
    }

    async fn find_complaint(&self, id: ComplaintId) -> Result<Option<Complaint>, StoreError> {
        self.0.find_complaint(id).await
    }

    async fn record_response(
        &self,
        id: ComplaintId,
        text: &str,
        responder: UserId,
    ) -> Result<Option<Complaint>, StoreError> {
        self.0.record_response(id, text, responder).await
    }

    async fn mark_resolved(&self, id: ComplaintId) -> Result<Option<Complaint>, StoreError> {
        self.0.mark_resolved(id).await?;
        self.0.mark_resolved(id).await
    }

    async fn select_complaints(&self, filter: ComplaintFilter) -> Result<Vec<Complaint>, StoreError> {
        self.0.select_complaints(filter).await
    }
}

#[tokio::test]
async fn losing_a_resolve_race_reports_the_current_status() {
    let fx = Fixture::new().await;
    let student = fx.user("Student", Role::Student).await;
    let lecturer = fx.user("Lecturer", Role::Lecturer).await;
    let filed = fx.service.create(&student, lecturer.id, "text").await.unwrap();
    fx.service.respond(filed.id, &lecturer, "done").await.unwrap();

    let racing = ComplaintService::new(
        Arc::new(ResolvedElsewhere(SqliteComplaintStore::new(fx.db_pool.clone()))),
        Duration::from_secs(10),
    );
    let err = racing.resolve(filed.id, &student).await.unwrap_err();

    assert!(
        matches!(
            err,
            ComplaintError::InvalidTransition { id, status: ComplaintStatus::Resolved } if id == filed.id
        ),
        "{err:?}"
    );
}
