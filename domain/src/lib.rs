//! Domain library for the club registry.
//!
//! This crate holds the entity types, ports (traits), validation rules, error
//! definitions and the services that coordinate them. Keep adapters and IO
//! concerns out of this crate; the only adapter living here is the in-memory
//! store used by tests and local runs.

use std::fmt::{Display, Formatter};
use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Identity of a stored member. Assigned by the repository on insert.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemberId(String);

impl MemberId {
    pub fn new<S: Into<String>>(s: S) -> Self {
        Self(s.into())
    }

    /// Fresh random identity for repositories that generate their own keys.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for MemberId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity of a stored club. Assigned by the repository on insert.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClubId(String);

impl ClubId {
    pub fn new<S: Into<String>>(s: S) -> Self {
        Self(s.into())
    }

    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ClubId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Input data for creating or overwriting a member.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewMember {
    pub name: String,
    pub email: String,
    pub birth_date: NaiveDate,
}

/// Stored member record, without its club links.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Member {
    pub id: MemberId,
    pub name: String,
    pub email: String,
    pub birth_date: NaiveDate,
}

impl Member {
    pub fn new(id: MemberId, input: NewMember) -> Self {
        Self {
            id,
            name: input.name,
            email: input.email,
            birth_date: input.birth_date,
        }
    }

    /// Overwrite the profile fields with `input`. The identity is kept.
    pub fn apply(&mut self, input: NewMember) {
        self.name = input.name;
        self.email = input.email;
        self.birth_date = input.birth_date;
    }
}

/// A member together with every club it is linked to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemberWithClubs {
    pub member: Member,
    pub clubs: Vec<Club>,
}

/// Input data for creating or overwriting a club.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewClub {
    pub name: String,
    pub founded_on: NaiveDate,
    /// URL of the club's image.
    pub image: String,
    pub description: String,
}

/// Stored club record, without its member links.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Club {
    pub id: ClubId,
    pub name: String,
    pub founded_on: NaiveDate,
    pub image: String,
    pub description: String,
}

impl Club {
    pub fn new(id: ClubId, input: NewClub) -> Self {
        Self {
            id,
            name: input.name,
            founded_on: input.founded_on,
            image: input.image,
            description: input.description,
        }
    }

    /// Overwrite the profile fields with `input`. The identity is kept.
    pub fn apply(&mut self, input: NewClub) {
        self.name = input.name;
        self.founded_on = input.founded_on;
        self.image = input.image;
        self.description = input.description;
    }
}

/// A club together with every member linked to it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClubWithMembers {
    pub club: Club,
    pub members: Vec<Member>,
}

impl ClubWithMembers {
    pub fn has_member(&self, id: &MemberId) -> bool {
        self.members.iter().any(|m| &m.id == id)
    }
}

/// Repository port for persisting and loading members.
pub trait MemberRepository: Send + Sync {
    /// All members with their clubs populated.
    fn find_all(&self) -> Result<Vec<MemberWithClubs>, CoreError>;
    fn find_by_id(&self, id: &MemberId) -> Result<Option<MemberWithClubs>, CoreError>;
    /// Store a new member; the repository assigns the identity.
    fn insert(&self, member: NewMember) -> Result<Member, CoreError>;
    /// Overwrite the stored fields of an existing member. Links are untouched.
    fn update(&self, member: &Member) -> Result<(), CoreError>;
    /// Remove a member and every link pointing at it.
    fn remove(&self, id: &MemberId) -> Result<(), CoreError>;
}

/// Repository port for clubs and the club-member links.
pub trait ClubRepository: Send + Sync {
    fn find_all(&self) -> Result<Vec<ClubWithMembers>, CoreError>;
    fn find_by_id(&self, id: &ClubId) -> Result<Option<ClubWithMembers>, CoreError>;
    fn insert(&self, club: NewClub) -> Result<Club, CoreError>;
    fn update(&self, club: &Club) -> Result<(), CoreError>;
    fn remove(&self, id: &ClubId) -> Result<(), CoreError>;
    /// Link a member to a club. Linking an already linked pair is a no-op.
    fn link_member(&self, club_id: &ClubId, member_id: &MemberId) -> Result<(), CoreError>;
    fn unlink_member(&self, club_id: &ClubId, member_id: &MemberId) -> Result<(), CoreError>;
    /// Replace the whole member set of a club atomically.
    fn replace_members(&self, club_id: &ClubId, member_ids: &[MemberId]) -> Result<(), CoreError>;
}

impl<T: MemberRepository + ?Sized> MemberRepository for Arc<T> {
    fn find_all(&self) -> Result<Vec<MemberWithClubs>, CoreError> {
        (**self).find_all()
    }

    fn find_by_id(&self, id: &MemberId) -> Result<Option<MemberWithClubs>, CoreError> {
        (**self).find_by_id(id)
    }

    fn insert(&self, member: NewMember) -> Result<Member, CoreError> {
        (**self).insert(member)
    }

    fn update(&self, member: &Member) -> Result<(), CoreError> {
        (**self).update(member)
    }

    fn remove(&self, id: &MemberId) -> Result<(), CoreError> {
        (**self).remove(id)
    }
}

impl<T: ClubRepository + ?Sized> ClubRepository for Arc<T> {
    fn find_all(&self) -> Result<Vec<ClubWithMembers>, CoreError> {
        (**self).find_all()
    }

    fn find_by_id(&self, id: &ClubId) -> Result<Option<ClubWithMembers>, CoreError> {
        (**self).find_by_id(id)
    }

    fn insert(&self, club: NewClub) -> Result<Club, CoreError> {
        (**self).insert(club)
    }

    fn update(&self, club: &Club) -> Result<(), CoreError> {
        (**self).update(club)
    }

    fn remove(&self, id: &ClubId) -> Result<(), CoreError> {
        (**self).remove(id)
    }

    fn link_member(&self, club_id: &ClubId, member_id: &MemberId) -> Result<(), CoreError> {
        (**self).link_member(club_id, member_id)
    }

    fn unlink_member(&self, club_id: &ClubId, member_id: &MemberId) -> Result<(), CoreError> {
        (**self).unlink_member(club_id, member_id)
    }

    fn replace_members(&self, club_id: &ClubId, member_ids: &[MemberId]) -> Result<(), CoreError> {
        (**self).replace_members(club_id, member_ids)
    }
}

/// Coarse classification of a [`CoreError`], used by transports to pick a
/// status code.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    PreconditionFailed,
    BadRequest,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::PreconditionFailed => "precondition_failed",
            ErrorKind::BadRequest => "bad_request",
            ErrorKind::Internal => "internal",
        }
    }
}

/// Core domain errors. Messages are part of the public contract.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("No se encontro ese club")]
    ClubNotFound,
    #[error("No se encontro ese socio")]
    MemberNotFound,
    #[error("No se encontro uno de los socios")]
    MembersNotFound,
    #[error("El correo no contiene @")]
    InvalidEmail,
    #[error("La descripción supera la longitud permitida de 100")]
    DescriptionTooLong,
    #[error("El club no esta relacionado con el socio")]
    NotRelated,
    #[error("campo {field} invalido: {reason}")]
    InvalidField {
        field: &'static str,
        reason: &'static str,
    },
    #[error("repository error: {0}")]
    Repository(String),
}

impl CoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::ClubNotFound | CoreError::MemberNotFound | CoreError::MembersNotFound => {
                ErrorKind::NotFound
            }
            CoreError::InvalidEmail | CoreError::DescriptionTooLong | CoreError::NotRelated => {
                ErrorKind::PreconditionFailed
            }
            CoreError::InvalidField { .. } => ErrorKind::BadRequest,
            CoreError::Repository(_) => ErrorKind::Internal,
        }
    }
}

pub mod adapters;
pub mod membership;
pub mod service;
pub mod validate;

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn member_apply_keeps_identity() {
        let mut member = Member::new(
            MemberId::new("m-1"),
            NewMember {
                name: "Ana".into(),
                email: "ana@club.co".into(),
                birth_date: date(1990, 1, 2),
            },
        );
        member.apply(NewMember {
            name: "Ana Maria".into(),
            email: "am@club.co".into(),
            birth_date: date(1991, 3, 4),
        });
        assert_eq!(member.id.as_str(), "m-1");
        assert_eq!(member.name, "Ana Maria");
        assert_eq!(member.email, "am@club.co");
        assert_eq!(member.birth_date, date(1991, 3, 4));
    }

    #[test]
    fn club_apply_keeps_identity() {
        let mut club = Club::new(
            ClubId::new("c-1"),
            NewClub {
                name: "Remo".into(),
                founded_on: date(1950, 5, 5),
                image: "https://img.example/remo.png".into(),
                description: "Club de remo".into(),
            },
        );
        club.apply(NewClub {
            name: "Remo y Vela".into(),
            founded_on: date(1951, 6, 6),
            image: "https://img.example/vela.png".into(),
            description: "Club de remo y vela".into(),
        });
        assert_eq!(club.id.as_str(), "c-1");
        assert_eq!(club.name, "Remo y Vela");
        assert_eq!(club.image, "https://img.example/vela.png");
    }

    #[test]
    fn generated_ids_are_unique() {
        assert_ne!(MemberId::generate(), MemberId::generate());
        assert_ne!(ClubId::generate(), ClubId::generate());
    }

    #[test]
    fn error_kinds_and_messages() {
        assert_eq!(CoreError::ClubNotFound.kind(), ErrorKind::NotFound);
        assert_eq!(CoreError::MembersNotFound.kind(), ErrorKind::NotFound);
        assert_eq!(CoreError::NotRelated.kind(), ErrorKind::PreconditionFailed);
        assert_eq!(CoreError::InvalidEmail.to_string(), "El correo no contiene @");
        assert_eq!(
            CoreError::NotRelated.to_string(),
            "El club no esta relacionado con el socio"
        );
        let err = CoreError::InvalidField {
            field: "name",
            reason: "no puede estar vacio",
        };
        assert_eq!(err.kind(), ErrorKind::BadRequest);
        assert_eq!(err.to_string(), "campo name invalido: no puede estar vacio");
    }
}
