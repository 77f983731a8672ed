//! Feature-module registration units and the route table built from them.

use std::{collections::HashMap, fmt};

use axum::{
    Router,
    handler::Handler,
    http::Method,
    routing::{self, MethodRouter},
};
use thiserror::Error;

/// Whether a route may be reached without credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    Protected,
}

impl Access {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Protected => "protected",
        }
    }
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteSpec {
    pub method: Method,
    pub path: &'static str,
    pub access: Access,
}

/// What a feature registration function hands back to the composition root:
/// a router with its state already applied and the routes it declares.
pub struct FeatureModule {
    pub name: &'static str,
    pub router: Router,
    pub routes: Vec<RouteSpec>,
}

impl fmt::Debug for FeatureModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeatureModule")
            .field("name", &self.name)
            .field("routes", &self.routes)
            .finish()
    }
}

/// Builds a [`FeatureModule`] while keeping the router and the declared
/// route list in step.
pub struct FeatureBuilder<S> {
    name: &'static str,
    router: Router<S>,
    routes: Vec<RouteSpec>,
}

impl<S> FeatureBuilder<S>
where
    S: Clone + Send + Sync + 'static,
{
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            router: Router::new(),
            routes: Vec::new(),
        }
    }

    pub fn get<H, T>(self, path: &'static str, access: Access, handler: H) -> Self
    where
        H: Handler<T, S>,
        T: 'static,
    {
        self.route(Method::GET, path, access, routing::get(handler))
    }

    pub fn post<H, T>(self, path: &'static str, access: Access, handler: H) -> Self
    where
        H: Handler<T, S>,
        T: 'static,
    {
        self.route(Method::POST, path, access, routing::post(handler))
    }

    pub fn patch<H, T>(self, path: &'static str, access: Access, handler: H) -> Self
    where
        H: Handler<T, S>,
        T: 'static,
    {
        self.route(Method::PATCH, path, access, routing::patch(handler))
    }

    pub fn delete<H, T>(self, path: &'static str, access: Access, handler: H) -> Self
    where
        H: Handler<T, S>,
        T: 'static,
    {
        self.route(Method::DELETE, path, access, routing::delete(handler))
    }

    fn route(
        mut self,
        method: Method,
        path: &'static str,
        access: Access,
        endpoint: MethodRouter<S>,
    ) -> Self {
        self.router = self.router.route(path, endpoint);
        self.routes.push(RouteSpec {
            method,
            path,
            access,
        });
        self
    }

    pub fn with_state(self, state: S) -> FeatureModule {
        FeatureModule {
            name: self.name,
            router: self.router.with_state(state),
            routes: self.routes,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("route `{method} {path}` registered by both `{first}` and `{second}`")]
pub struct RouteConflict {
    pub method: Method,
    pub path: &'static str,
    pub first: &'static str,
    pub second: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteEntry {
    pub feature: &'static str,
    pub route: RouteSpec,
}

/// Every registered route in registration order, plus an index the guard
/// uses to look up access by `(method, matched path)`.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    entries: Vec<RouteEntry>,
    index: HashMap<(Method, &'static str), usize>,
}

impl RouteTable {
    pub fn from_features(features: &[FeatureModule]) -> Result<Self, RouteConflict> {
        let mut table = Self::default();
        for feature in features {
            for route in &feature.routes {
                table.insert(feature.name, route.clone())?;
            }
        }
        Ok(table)
    }

    fn insert(&mut self, feature: &'static str, route: RouteSpec) -> Result<(), RouteConflict> {
        let key = (route.method.clone(), route.path);
        if let Some(&existing) = self.index.get(&key) {
            return Err(RouteConflict {
                method: route.method,
                path: route.path,
                first: self.entries[existing].feature,
                second: feature,
            });
        }
        self.index.insert(key, self.entries.len());
        self.entries.push(RouteEntry { feature, route });
        Ok(())
    }

    /// Access level of the route serving `method` on `path`. `HEAD` is
    /// answered by the `GET` handler, so it shares that route's access.
    pub fn access(&self, method: &Method, path: &str) -> Option<Access> {
        let method = if *method == Method::HEAD {
            &Method::GET
        } else {
            method
        };
        self.entries
            .iter()
            .find(|entry| entry.route.method == *method && entry.route.path == path)
            .map(|entry| entry.route.access)
    }

    pub fn entries(&self) -> &[RouteEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
