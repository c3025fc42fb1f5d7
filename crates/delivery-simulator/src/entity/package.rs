//! Parcels and the color layers painted on them.

use delivery_domain::{PackageColor, SearchStrategy, Tint, Vector3};

use super::EntityId;

/// A parcel waiting for, riding on, or delivered by a drone.
#[derive(Debug, Clone, Default)]
pub struct Package {
    destination: Option<Vector3>,
    owner: Option<EntityId>,
    requires_delivery: bool,
    search: SearchStrategy,
    delivered: bool,
    tint: Option<Tint>,
}

impl Package {
    /// A package still waiting to be scheduled.
    #[must_use]
    pub fn new(colors: &[PackageColor]) -> Self {
        Self {
            requires_delivery: true,
            tint: Self::layer(colors),
            ..Self::default()
        }
    }

    /// Fold color layers, each mixed over the one beneath it.
    fn layer(colors: &[PackageColor]) -> Option<Tint> {
        colors.iter().fold(None, |inner, color| {
            let tint = color.tint();
            Some(inner.map_or(tint, |inner: Tint| tint.mix(&inner)))
        })
    }

    /// Bind to a receiver. The package no longer accepts other trips.
    pub fn bind(&mut self, owner: EntityId, destination: Vector3, search: SearchStrategy) {
        self.owner = Some(owner);
        self.destination = Some(destination);
        self.search = search;
        self.requires_delivery = false;
    }

    /// Drop the binding so the package can be scheduled again.
    pub fn unbind(&mut self) {
        if self.delivered {
            return;
        }
        self.owner = None;
        self.destination = None;
        self.requires_delivery = true;
    }

    /// Release to the owner. Returns the owner the first time only.
    pub fn hand_off(&mut self) -> Option<EntityId> {
        if self.delivered {
            return None;
        }
        self.delivered = true;
        self.owner
    }

    #[must_use]
    pub const fn requires_delivery(&self) -> bool {
        self.requires_delivery
    }

    #[must_use]
    pub const fn is_delivered(&self) -> bool {
        self.delivered
    }

    #[must_use]
    pub const fn owner(&self) -> Option<EntityId> {
        self.owner
    }

    #[must_use]
    pub const fn destination(&self) -> Option<Vector3> {
        self.destination
    }

    #[must_use]
    pub const fn search(&self) -> SearchStrategy {
        self.search
    }

    #[must_use]
    pub const fn tint(&self) -> Option<Tint> {
        self.tint
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_then_hand_off_once() {
        let mut package = Package::new(&[]);
        assert!(package.requires_delivery());

        package.bind(4, Vector3::new(1.0, 0.0, 1.0), SearchStrategy::Astar);
        assert!(!package.requires_delivery());
        assert_eq!(package.search(), SearchStrategy::Astar);

        assert_eq!(package.hand_off(), Some(4));
        assert_eq!(package.hand_off(), None);
        assert!(package.is_delivered());
    }

    #[test]
    fn test_unbind_reopens_package() {
        let mut package = Package::new(&[]);
        package.bind(4, Vector3::new(1.0, 0.0, 1.0), SearchStrategy::Dfs);
        package.unbind();

        assert!(package.requires_delivery());
        assert!(package.owner().is_none() && package.destination().is_none());
        assert_eq!(package.hand_off(), None);
    }

    #[test]
    fn test_color_layers_average() {
        let package = Package::new(&[PackageColor::Red, PackageColor::Blue]);
        assert_eq!(package.tint().map(|t| t.hue), Some(120.0));
        assert!(Package::new(&[]).tint().is_none());
    }
}
