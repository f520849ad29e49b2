//! Host and service visibility for a requesting identity.

use crate::entities::{Host, Service};
use livequery_core::{EngineConfig, Identity, ServiceAuthorization};

/// Decides which hosts and services an identity may see.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Authorizer {
    service_authorization: ServiceAuthorization,
}

impl Authorizer {
    pub fn new(service_authorization: ServiceAuthorization) -> Self {
        Self {
            service_authorization,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.service_authorization)
    }

    pub fn service_authorization(&self) -> ServiceAuthorization {
        self.service_authorization
    }

    /// A contact sees a host it is a contact of, directly or through one of
    /// the host's contact groups.
    pub fn host_visible(&self, identity: &Identity, host: &Host) -> bool {
        is_contact(identity, &host.contacts, &host.contact_groups)
    }

    /// Like [`Authorizer::host_visible`] for the service itself. In loose
    /// mode a contact of the service's host sees the service too.
    pub fn service_visible(&self, identity: &Identity, service: &Service) -> bool {
        if is_contact(identity, &service.contacts, &service.contact_groups) {
            return true;
        }
        self.service_authorization == ServiceAuthorization::Loose
            && self.host_visible(identity, &service.host)
    }

    /// Visibility of something attached to a host or to one of its
    /// services: the service decides when there is one, the host otherwise.
    pub fn attached_visible(&self, identity: &Identity, host: &Host, service: Option<&Service>) -> bool {
        match service {
            Some(service) => self.service_visible(identity, service),
            None => self.host_visible(identity, host),
        }
    }
}

fn is_contact(identity: &Identity, contacts: &[String], contact_groups: &[String]) -> bool {
    match identity {
        Identity::Unrestricted => true,
        Identity::Unknown { .. } => false,
        Identity::Contact { name, .. } => {
            contacts.iter().any(|contact| contact == name)
                || contact_groups.iter().any(|group| identity.is_member_of(group))
        }
    }
}
