/*!
# RestProxy DevKit - Stubs et utilitaires pour le développement

Bibliothèque facilitant le test du plugin sans backend réel:
- Mock backend HTTP (réponses scriptées, délais, enregistrement des requêtes)
- Fixtures JSON conformes aux endpoints `/fingerprint`, `/stats`, `/reserve`
- Helpers de tests (logging, attente de conditions, adresses injoignables)
*/

pub mod fixtures;
pub mod mock_backend;
pub mod test_utils;

pub use fixtures::BackendFixtures;
pub use mock_backend::{MockBackend, MockReply, RecordedRequest};
pub use test_utils::{init_tracing, unreachable_address, wait_until};
