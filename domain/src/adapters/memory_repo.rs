use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard};

use crate::{
    Club, ClubId, ClubRepository, ClubWithMembers, CoreError, Member, MemberId,
    MemberRepository, MemberWithClubs, NewClub, NewMember,
};

#[derive(Default)]
struct Tables {
    members: BTreeMap<MemberId, Member>,
    clubs: BTreeMap<ClubId, Club>,
    links: BTreeSet<(ClubId, MemberId)>,
}

impl Tables {
    fn member_with_clubs(&self, member: &Member) -> MemberWithClubs {
        let clubs = self
            .links
            .iter()
            .filter(|(_, m)| m == &member.id)
            .filter_map(|(c, _)| self.clubs.get(c).cloned())
            .collect();
        MemberWithClubs {
            member: member.clone(),
            clubs,
        }
    }

    fn club_with_members(&self, club: &Club) -> ClubWithMembers {
        let members = self
            .links
            .iter()
            .filter(|(c, _)| c == &club.id)
            .filter_map(|(_, m)| self.members.get(m).cloned())
            .collect();
        ClubWithMembers {
            club: club.clone(),
            members,
        }
    }
}

/// Simple in-memory store implementing both repository ports. Members, clubs
/// and links share one mutex so cascades stay consistent.
pub struct InMemoryStore {
    inner: Mutex<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Tables::default()),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, CoreError> {
        self.inner
            .lock()
            .map_err(|_| CoreError::Repository("mutex poisoned".into()))
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemberRepository for InMemoryStore {
    fn find_all(&self) -> Result<Vec<MemberWithClubs>, CoreError> {
        let tables = self.lock()?;
        Ok(tables
            .members
            .values()
            .map(|m| tables.member_with_clubs(m))
            .collect())
    }

    fn find_by_id(&self, id: &MemberId) -> Result<Option<MemberWithClubs>, CoreError> {
        let tables = self.lock()?;
        Ok(tables.members.get(id).map(|m| tables.member_with_clubs(m)))
    }

    fn insert(&self, member: NewMember) -> Result<Member, CoreError> {
        let mut tables = self.lock()?;
        let stored = Member::new(MemberId::generate(), member);
        tables.members.insert(stored.id.clone(), stored.clone());
        Ok(stored)
    }

    fn update(&self, member: &Member) -> Result<(), CoreError> {
        let mut tables = self.lock()?;
        match tables.members.get_mut(&member.id) {
            Some(slot) => {
                *slot = member.clone();
                Ok(())
            }
            None => Err(CoreError::MemberNotFound),
        }
    }

    fn remove(&self, id: &MemberId) -> Result<(), CoreError> {
        let mut tables = self.lock()?;
        if tables.members.remove(id).is_none() {
            return Err(CoreError::MemberNotFound);
        }
        tables.links.retain(|(_, m)| m != id);
        Ok(())
    }
}

impl ClubRepository for InMemoryStore {
    fn find_all(&self) -> Result<Vec<ClubWithMembers>, CoreError> {
        let tables = self.lock()?;
        Ok(tables
            .clubs
            .values()
            .map(|c| tables.club_with_members(c))
            .collect())
    }

    fn find_by_id(&self, id: &ClubId) -> Result<Option<ClubWithMembers>, CoreError> {
        let tables = self.lock()?;
        Ok(tables.clubs.get(id).map(|c| tables.club_with_members(c)))
    }

    fn insert(&self, club: NewClub) -> Result<Club, CoreError> {
        let mut tables = self.lock()?;
        let stored = Club::new(ClubId::generate(), club);
        tables.clubs.insert(stored.id.clone(), stored.clone());
        Ok(stored)
    }

    fn update(&self, club: &Club) -> Result<(), CoreError> {
        let mut tables = self.lock()?;
        match tables.clubs.get_mut(&club.id) {
            Some(slot) => {
                *slot = club.clone();
                Ok(())
            }
            None => Err(CoreError::ClubNotFound),
        }
    }

    fn remove(&self, id: &ClubId) -> Result<(), CoreError> {
        let mut tables = self.lock()?;
        if tables.clubs.remove(id).is_none() {
            return Err(CoreError::ClubNotFound);
        }
        tables.links.retain(|(c, _)| c != id);
        Ok(())
    }

    fn link_member(&self, club_id: &ClubId, member_id: &MemberId) -> Result<(), CoreError> {
        let mut tables = self.lock()?;
        if !tables.clubs.contains_key(club_id) {
            return Err(CoreError::ClubNotFound);
        }
        if !tables.members.contains_key(member_id) {
            return Err(CoreError::MemberNotFound);
        }
        tables.links.insert((club_id.clone(), member_id.clone()));
        Ok(())
    }

    fn unlink_member(&self, club_id: &ClubId, member_id: &MemberId) -> Result<(), CoreError> {
        let mut tables = self.lock()?;
        if !tables.links.remove(&(club_id.clone(), member_id.clone())) {
            return Err(CoreError::NotRelated);
        }
        Ok(())
    }

    fn replace_members(&self, club_id: &ClubId, member_ids: &[MemberId]) -> Result<(), CoreError> {
        let mut tables = self.lock()?;
        if !tables.clubs.contains_key(club_id) {
            return Err(CoreError::ClubNotFound);
        }
        if member_ids.iter().any(|m| !tables.members.contains_key(m)) {
            return Err(CoreError::MembersNotFound);
        }
        tables.links.retain(|(c, _)| c != club_id);
        for member_id in member_ids {
            tables.links.insert((club_id.clone(), member_id.clone()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn new_member(name: &str) -> NewMember {
        NewMember {
            name: name.into(),
            email: format!("{name}@club.co"),
            birth_date: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
        }
    }

    fn new_club(name: &str) -> NewClub {
        NewClub {
            name: name.into(),
            founded_on: NaiveDate::from_ymd_opt(1960, 1, 1).unwrap(),
            image: "https://img.example/c.png".into(),
            description: "desc".into(),
        }
    }

    #[test]
    fn insert_assigns_distinct_ids() {
        let store = InMemoryStore::new();
        let a = MemberRepository::insert(&store, new_member("a")).unwrap();
        let b = MemberRepository::insert(&store, new_member("b")).unwrap();
        assert_ne!(a.id, b.id);
        let got = MemberRepository::find_by_id(&store, &a.id).unwrap().unwrap();
        assert_eq!(got.member, a);
        assert!(got.clubs.is_empty());
    }

    #[test]
    fn links_are_visible_from_both_sides() {
        let store = InMemoryStore::new();
        let m = MemberRepository::insert(&store, new_member("m")).unwrap();
        let c = ClubRepository::insert(&store, new_club("c")).unwrap();
        store.link_member(&c.id, &m.id).unwrap();
        store.link_member(&c.id, &m.id).unwrap();

        let club = ClubRepository::find_by_id(&store, &c.id).unwrap().unwrap();
        assert_eq!(club.members, vec![m.clone()]);
        let member = MemberRepository::find_by_id(&store, &m.id).unwrap().unwrap();
        assert_eq!(member.clubs, vec![c]);
    }

    #[test]
    fn removing_a_club_detaches_its_members() {
        let store = InMemoryStore::new();
        let m = MemberRepository::insert(&store, new_member("m")).unwrap();
        let c = ClubRepository::insert(&store, new_club("c")).unwrap();
        store.link_member(&c.id, &m.id).unwrap();

        ClubRepository::remove(&store, &c.id).unwrap();
        let member = MemberRepository::find_by_id(&store, &m.id).unwrap().unwrap();
        assert!(member.clubs.is_empty());
        assert!(matches!(
            ClubRepository::remove(&store, &c.id),
            Err(CoreError::ClubNotFound)
        ));
    }

    #[test]
    fn update_unknown_member_is_not_found() {
        let store = InMemoryStore::new();
        let ghost = Member::new(MemberId::new("0"), new_member("ghost"));
        assert!(matches!(
            MemberRepository::update(&store, &ghost),
            Err(CoreError::MemberNotFound)
        ));
    }
}
