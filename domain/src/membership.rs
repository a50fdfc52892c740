//! Coordination of the club-member links.
//!
//! Every operation follows the same sequence: look up the club, look up the
//! member(s), check the relationship, mutate the link table and read the
//! result back. Lookups run in that order, so an unknown club is always
//! reported before an unknown member.

use tracing::{debug, info};

use crate::{ClubId, ClubRepository, ClubWithMembers, CoreError, Member, MemberId, MemberRepository};

#[derive(Clone)]
pub struct MembershipService<C: ClubRepository, M: MemberRepository> {
    clubs: C,
    members: M,
}

impl<C: ClubRepository, M: MemberRepository> MembershipService<C, M> {
    pub fn new(clubs: C, members: M) -> Self {
        Self { clubs, members }
    }

    fn load_club(&self, club_id: &ClubId) -> Result<ClubWithMembers, CoreError> {
        self.clubs
            .find_by_id(club_id)?
            .ok_or(CoreError::ClubNotFound)
    }

    fn load_member(&self, member_id: &MemberId) -> Result<Member, CoreError> {
        self.members
            .find_by_id(member_id)?
            .map(|m| m.member)
            .ok_or(CoreError::MemberNotFound)
    }

    /// Link a member to a club and return the club with its members.
    ///
    /// Adding a member that is already linked leaves the club unchanged.
    pub fn add_member_to_club(
        &self,
        club_id: &ClubId,
        member_id: &MemberId,
    ) -> Result<ClubWithMembers, CoreError> {
        let club = self.load_club(club_id)?;
        let member = self.load_member(member_id)?;
        if club.has_member(&member.id) {
            debug!(%club_id, %member_id, "member already linked");
            return Ok(club);
        }
        self.clubs.link_member(club_id, &member.id)?;
        info!(%club_id, %member_id, "member added to club");
        self.load_club(club_id)
    }

    pub fn find_members_from_club(&self, club_id: &ClubId) -> Result<Vec<Member>, CoreError> {
        Ok(self.load_club(club_id)?.members)
    }

    pub fn find_member_from_club(
        &self,
        club_id: &ClubId,
        member_id: &MemberId,
    ) -> Result<Member, CoreError> {
        let club = self.load_club(club_id)?;
        let member = self.load_member(member_id)?;
        if !club.has_member(&member.id) {
            debug!(%club_id, %member_id, "member not linked to club");
            return Err(CoreError::NotRelated);
        }
        Ok(member)
    }

    /// Replace the whole member set of a club with `member_ids`.
    ///
    /// Every id must name an existing member; nothing is written otherwise.
    pub fn update_members_from_club(
        &self,
        club_id: &ClubId,
        member_ids: &[MemberId],
    ) -> Result<ClubWithMembers, CoreError> {
        self.load_club(club_id)?;
        for member_id in member_ids {
            if self.members.find_by_id(member_id)?.is_none() {
                debug!(%club_id, %member_id, "unknown member in replacement set");
                return Err(CoreError::MembersNotFound);
            }
        }
        self.clubs.replace_members(club_id, member_ids)?;
        info!(%club_id, count = member_ids.len(), "club members replaced");
        self.load_club(club_id)
    }

    pub fn delete_member_from_club(
        &self,
        club_id: &ClubId,
        member_id: &MemberId,
    ) -> Result<(), CoreError> {
        let club = self.load_club(club_id)?;
        let member = self.load_member(member_id)?;
        if !club.has_member(&member.id) {
            debug!(%club_id, %member_id, "member not linked to club");
            return Err(CoreError::NotRelated);
        }
        self.clubs.unlink_member(club_id, &member.id)?;
        info!(%club_id, %member_id, "member removed from club");
        Ok(())
    }
}
