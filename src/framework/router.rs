//! Round-robin delivery to the members of a registry group.

use crate::framework::{Registry, ServiceKey};
use tracing::debug;

/// Spreads messages over whatever members `key` currently has.
///
/// Members that stopped since the last lookup are skipped. With a stable membership of
/// `m` actors, `n` routed messages reach every member either `n / m` or `n / m + 1` times.
pub struct GroupRouter<M> {
    registry: Registry,
    key: ServiceKey<M>,
    next: usize,
}

impl<M: Send + 'static> GroupRouter<M> {
    pub fn new(registry: Registry, key: ServiceKey<M>) -> Self {
        Self {
            registry,
            key,
            next: 0,
        }
    }

    /// Delivers `msg` to the next live member, or hands it back when there is none.
    pub fn route(&mut self, mut msg: M) -> Result<(), M> {
        let members = self.registry.lookup(self.key);
        for offset in 0..members.len() {
            let index = (self.next + offset) % members.len();
            match members[index].tell(msg) {
                Ok(()) => {
                    self.next = index.wrapping_add(1);
                    return Ok(());
                }
                Err(returned) => {
                    debug!(
                        service = self.key.id(),
                        member = %members[index].name(),
                        "Skipping stopped member"
                    );
                    msg = returned.0;
                }
            }
        }
        Err(msg)
    }
}
