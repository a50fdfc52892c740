use tracing::{debug, info};

use crate::validate::{validate_club, validate_member};
use crate::{
    Club, ClubId, ClubRepository, ClubWithMembers, CoreError, Member, MemberId,
    MemberRepository, MemberWithClubs, NewClub, NewMember,
};

/// Application service for member records.
///
/// Holds a repository handle only; every call reads current state from
/// storage.
#[derive(Clone)]
pub struct MemberService<R: MemberRepository> {
    repo: R,
}

impl<R: MemberRepository> MemberService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// All members with their clubs populated.
    pub fn find_all(&self) -> Result<Vec<MemberWithClubs>, CoreError> {
        self.repo.find_all()
    }

    pub fn find_one(&self, id: &MemberId) -> Result<MemberWithClubs, CoreError> {
        self.repo.find_by_id(id)?.ok_or(CoreError::MemberNotFound)
    }

    pub fn create(&self, input: NewMember) -> Result<Member, CoreError> {
        if let Err(e) = validate_member(&input) {
            debug!(err = %e, "member rejected");
            return Err(e);
        }
        let member = self.repo.insert(input)?;
        info!(member_id = %member.id, "member created");
        Ok(member)
    }

    /// Overwrite the profile of an existing member. Club links are untouched.
    pub fn update(&self, id: &MemberId, input: NewMember) -> Result<Member, CoreError> {
        let mut stored = self.find_one(id)?.member;
        if let Err(e) = validate_member(&input) {
            debug!(member_id = %id, err = %e, "member update rejected");
            return Err(e);
        }
        stored.apply(input);
        self.repo.update(&stored)?;
        info!(member_id = %id, "member updated");
        Ok(stored)
    }

    pub fn delete(&self, id: &MemberId) -> Result<(), CoreError> {
        self.find_one(id)?;
        self.repo.remove(id)?;
        info!(member_id = %id, "member deleted");
        Ok(())
    }
}

/// Application service for club records.
#[derive(Clone)]
pub struct ClubService<R: ClubRepository> {
    repo: R,
}

impl<R: ClubRepository> ClubService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn find_all(&self) -> Result<Vec<ClubWithMembers>, CoreError> {
        self.repo.find_all()
    }

    pub fn find_one(&self, id: &ClubId) -> Result<ClubWithMembers, CoreError> {
        self.repo.find_by_id(id)?.ok_or(CoreError::ClubNotFound)
    }

    pub fn create(&self, input: NewClub) -> Result<Club, CoreError> {
        if let Err(e) = validate_club(&input) {
            debug!(err = %e, "club rejected");
            return Err(e);
        }
        let club = self.repo.insert(input)?;
        info!(club_id = %club.id, "club created");
        Ok(club)
    }

    pub fn update(&self, id: &ClubId, input: NewClub) -> Result<Club, CoreError> {
        let mut stored = self.find_one(id)?.club;
        if let Err(e) = validate_club(&input) {
            debug!(club_id = %id, err = %e, "club update rejected");
            return Err(e);
        }
        stored.apply(input);
        self.repo.update(&stored)?;
        info!(club_id = %id, "club updated");
        Ok(stored)
    }

    pub fn delete(&self, id: &ClubId) -> Result<(), CoreError> {
        self.find_one(id)?;
        self.repo.remove(id)?;
        info!(club_id = %id, "club deleted");
        Ok(())
    }
}
