//! Site collaborator seam
//!
//! The site registry lives outside this core; all we consume from it is
//! the currently focused site id, used to default the site scope of
//! camera listings.

/// External site registry collaborator
pub trait SiteDirectory: Send + Sync {
    fn current_site_id(&self) -> u32;
}

/// Fixed site scope, configured at startup
pub struct StaticSiteDirectory {
    site_id: u32,
}

impl StaticSiteDirectory {
    pub fn new(site_id: u32) -> Self {
        Self { site_id }
    }
}

impl SiteDirectory for StaticSiteDirectory {
    fn current_site_id(&self) -> u32 {
        self.site_id
    }
}
