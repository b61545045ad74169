//! Purchase-attempt [`Database`] implementations.

use common::operations::{By, Reserve, Select, Update};
use tracerr::Traced;

use crate::{
    domain::{flash_sale, purchase::attempt},
    infra::{
        database::{self, in_memory, InMemory},
        Database,
    },
};

impl Database<Reserve<attempt::Record>> for InMemory {
    type Ok = attempt::ClaimOutcome;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Reserve(record): Reserve<attempt::Record>,
    ) -> Result<Self::Ok, Self::Err> {
        use attempt::{ClaimOutcome, Status};

        // `record.status` is the stage being claimed for: `Submitted`
        // queues the attempt, `Pending` takes it over for processing.
        let mut attempts = in_memory::write(&self.0.attempts);
        match attempts.get(&record.id).map(|r| r.status) {
            // A failed attempt may be retried, so the claim is re-acquired.
            None | Some(Status::Failed(_)) => {
                _ = attempts.insert(record.id, record);
                Ok(ClaimOutcome::Acquired)
            }
            // A queued attempt is claimable for processing, but a second
            // submission of it is not.
            Some(Status::Submitted) => match record.status {
                Status::Pending => {
                    _ = attempts.insert(record.id, record);
                    Ok(ClaimOutcome::Acquired)
                }
                Status::Submitted
                | Status::Committed(_)
                | Status::Failed(_) => Ok(ClaimOutcome::InFlight),
            },
            Some(Status::Pending) => Ok(ClaimOutcome::InFlight),
            Some(Status::Committed(receipt)) => {
                Ok(ClaimOutcome::Committed(receipt))
            }
        }
    }
}

impl Database<Update<attempt::Record>> for InMemory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(record): Update<attempt::Record>,
    ) -> Result<Self::Ok, Self::Err> {
        _ = in_memory::write(&self.0.attempts).insert(record.id, record);
        Ok(())
    }
}

impl Database<Select<By<Option<attempt::Record>, attempt::Id>>> for InMemory {
    type Ok = Option<attempt::Record>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<attempt::Record>, attempt::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(in_memory::read(&self.0.attempts).get(&by.into_inner()).copied())
    }
}

impl Database<Select<By<Vec<attempt::Record>, flash_sale::Id>>> for InMemory {
    type Ok = Vec<attempt::Record>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<attempt::Record>, flash_sale::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(in_memory::read(&self.0.attempts)
            .values()
            .filter(|r| r.flash_sale_id == id)
            .copied()
            .collect())
    }
}
