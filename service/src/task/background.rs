//! Background environment for running [`Task`]s.

use std::{
    error::Error,
    future::{Future, IntoFuture},
};

use futures::{
    future::{self, LocalBoxFuture},
    FutureExt as _, TryFutureExt as _,
};
use tokio::task;

#[cfg(doc)]
use crate::Task;

/// Background environment the purchase worker and the snapshot loop run
/// in.
///
/// [`Task`] futures are not required to be [`Send`], so they all share one
/// local set instead of the multi-threaded runtime. Nothing runs until the
/// [`Background`] itself is awaited: a caller holding one has committed to
/// driving it (usually for the lifetime of the process).
///
/// The resulting future resolves once every spawned [`Task`] has finished,
/// or with the first failure among them.
#[derive(Debug, Default)]
pub struct Background {
    /// Local set the [`Task`]s are spawned onto.
    set: task::LocalSet,

    /// Handles of the spawned [`Task`]s.
    handles: Vec<task::JoinHandle<Result<(), Box<dyn Error + 'static>>>>,
}

impl Background {
    /// Spawns a new [`Task`] inside this [`Background`] environment.
    pub fn spawn<F, E>(&mut self, future: F)
    where
        F: Future<Output = Result<(), E>> + 'static,
        E: Error + 'static,
    {
        self.handles.push(self.set.spawn_local(future.err_into()));
    }
}

impl IntoFuture for Background {
    type Output = Result<(), Box<dyn Error>>;
    type IntoFuture = LocalBoxFuture<'static, Self::Output>;

    fn into_future(self) -> Self::IntoFuture {
        let Self { set, handles } = self;
        let tasks =
            future::try_join_all(handles.into_iter().map(|handle| {
                handle.unwrap_or_else(|e| {
                    Err(Box::<dyn Error + 'static>::from(e))
                })
            }));
        // The set must be polled alongside the handles, otherwise the
        // spawned futures make no progress at all.
        future::try_join(set.map(Ok), tasks).map_ok(drop).boxed_local()
    }
}

#[cfg(test)]
mod spec {
    use std::io;

    use super::*;

    #[tokio::test]
    async fn resolves_once_every_task_finishes() {
        let mut bg = Background::default();
        bg.spawn(async { Ok::<_, io::Error>(()) });
        bg.spawn(async { Ok::<_, io::Error>(()) });

        assert!(bg.into_future().await.is_ok());
    }

    #[tokio::test]
    async fn surfaces_a_task_failure() {
        let mut bg = Background::default();
        bg.spawn(async { Ok::<_, io::Error>(()) });
        bg.spawn(async { Err(io::Error::other("boom")) });

        assert!(bg.into_future().await.is_err());
    }
}
