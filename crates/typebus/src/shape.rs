//! Runtime shape descriptors and the message envelope they are matched against.
//!
//! A [`Shape`] names a Rust type by its [`TypeId`]. A [`Message`] carries its
//! concrete shape plus any capability shapes the producer declared for it, so
//! a subscriber can ask for either the exact type or a capability such as
//! `dyn Notification`.

use std::any::{Any, TypeId, type_name};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use tracing::trace;

/// Runtime descriptor of a message type.
///
/// Two shapes are equal when they describe the same type. The type name is
/// kept for logging only.
///
/// A shape is *concrete* when it names a sized type, i.e. something a
/// payload can actually be. Unsized shapes (`dyn Trait`) are capabilities.
#[derive(Clone, Copy)]
pub struct Shape {
    id: TypeId,
    name: &'static str,
    concrete: bool,
}

impl Shape {
    /// Shape of `T`. `T` may be unsized, so `Shape::of::<dyn Trait>()`
    /// describes a capability rather than a concrete type.
    #[must_use]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
            // Pointers to unsized types carry metadata and are wider than thin ones.
            concrete: size_of::<*const T>() == size_of::<*const ()>(),
        }
    }

    /// The shape every message is assignable to.
    #[must_use]
    pub fn any() -> Self {
        Self::of::<dyn Any + Send + Sync>()
    }

    /// The underlying type id.
    #[must_use]
    pub fn type_id(&self) -> TypeId {
        self.id
    }

    /// Whether this shape names a sized type rather than a capability.
    #[must_use]
    pub fn is_concrete(&self) -> bool {
        self.concrete
    }

    /// Human readable type name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Whether `message` may be delivered to a subscriber of this shape.
    #[must_use]
    pub fn accepts(&self, message: &Message) -> bool {
        message.is_assignable_to(*self)
    }
}

impl PartialEq for Shape {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Shape {}

impl Hash for Shape {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Shape").field(&self.name).finish()
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// An emitted value together with the shapes it satisfies.
///
/// Cloning is cheap: the payload is shared behind an [`Arc`], so every
/// matching subscriber receives the same allocation.
#[derive(Clone)]
pub struct Message {
    payload: Arc<dyn Any + Send + Sync>,
    shape: Shape,
    capabilities: Arc<[Shape]>,
}

impl Message {
    /// Wrap a value. The message's shape is the value's concrete type.
    #[must_use]
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            payload: Arc::new(value),
            shape: Shape::of::<T>(),
            capabilities: Arc::from(Vec::new()),
        }
    }

    /// Declare that this message also satisfies capability `C`.
    ///
    /// Subscribers of `Shape::of::<C>()` will receive it in addition to
    /// subscribers of the concrete type. `C` must be unsized (`dyn Trait`):
    /// a message cannot claim to be a concrete type it is not, so sized `C`
    /// is ignored.
    #[must_use]
    pub fn with_capability<C: ?Sized + 'static>(mut self) -> Self {
        let shape = Shape::of::<C>();
        if shape.is_concrete() {
            trace!(payload = %self.shape, %shape, "Ignoring concrete capability");
            return self;
        }
        if !self.is_assignable_to(shape) {
            let mut capabilities = self.capabilities.to_vec();
            capabilities.push(shape);
            self.capabilities = Arc::from(capabilities);
        }
        self
    }

    /// The concrete shape of the payload.
    #[must_use]
    pub fn shape(&self) -> Shape {
        self.shape
    }

    /// Declared capability shapes.
    #[must_use]
    pub fn capabilities(&self) -> &[Shape] {
        &self.capabilities
    }

    /// Exact match, declared capability, or the catch-all [`Shape::any`].
    ///
    /// A concrete shape only ever matches the payload's own type.
    #[must_use]
    pub fn is_assignable_to(&self, shape: Shape) -> bool {
        if shape.is_concrete() {
            return self.shape == shape;
        }
        shape == Shape::any() || self.capabilities.contains(&shape)
    }

    /// Whether the payload's concrete type is `T`.
    #[must_use]
    pub fn is<T: Any>(&self) -> bool {
        self.shape == Shape::of::<T>()
    }

    /// Borrow the payload as `T`.
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.payload.downcast_ref::<T>()
    }

    /// Share the payload as `Arc<T>`.
    #[must_use]
    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        Arc::clone(&self.payload).downcast::<T>().ok()
    }
}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Message")
            .field("shape", &self.shape)
            .field("capabilities", &self.capabilities)
            .finish_non_exhaustive()
    }
}
