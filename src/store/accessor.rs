use std::{fmt, rc::Rc};

type Getter<Root, Field> = Rc<dyn Fn(&Root) -> Field>;
type Setter<Root, Field> = Rc<dyn Fn(&mut Root, Field)>;

/// A bidirectional projection from `Root` onto one of its parts.
///
/// Accessors are expected to obey the lens law: writing back what was just
/// read leaves the root unchanged. This is not checked at runtime; an
/// accessor that breaks it produces whatever values its setter computes.
///
/// Cloning is cheap, both halves are reference counted.
pub struct Accessor<Root, Field> {
    get: Getter<Root, Field>,
    set: Setter<Root, Field>,
}

impl<Root: 'static, Field: 'static> Accessor<Root, Field> {
    /// Builds an accessor from a getter and an in-place setter.
    pub fn new<G, S>(get: G, set: S) -> Self
    where
        G: Fn(&Root) -> Field + 'static,
        S: Fn(&mut Root, Field) + 'static,
    {
        Self {
            get: Rc::new(get),
            set: Rc::new(set),
        }
    }

    /// Reads the projected part of `root`.
    pub fn get(&self, root: &Root) -> Field {
        (self.get)(root)
    }

    /// Overwrites the projected part of `root` in place.
    pub fn set(&self, root: &mut Root, field: Field) {
        (self.set)(root, field)
    }

    /// Returns `root` with the projected part replaced by `field`.
    pub fn with(&self, mut root: Root, field: Field) -> Root {
        self.set(&mut root, field);
        root
    }

    /// Composes this accessor with one that projects further into `Field`.
    pub fn then<Sub: 'static>(&self, inner: &Accessor<Field, Sub>) -> Accessor<Root, Sub> {
        let outer_get = Rc::clone(&self.get);
        let outer_get_for_set = Rc::clone(&self.get);
        let outer_set = Rc::clone(&self.set);
        let inner_get = Rc::clone(&inner.get);
        let inner_set = Rc::clone(&inner.set);

        Accessor::new(
            move |root: &Root| inner_get(&outer_get(root)),
            move |root: &mut Root, sub: Sub| {
                let mut field = outer_get_for_set(root);
                inner_set(&mut field, sub);
                outer_set(root, field);
            },
        )
    }

    /// Checks `set(root, get(root)) == root` for one sample.
    pub fn satisfies_lens_law(&self, root: &Root) -> bool
    where
        Root: Clone + PartialEq,
    {
        let mut written = root.clone();
        self.set(&mut written, self.get(root));
        written == *root
    }
}

impl<Root: Clone + 'static> Accessor<Root, Root> {
    /// The accessor that projects the whole value.
    pub fn identity() -> Self {
        Accessor::new(Root::clone, |root: &mut Root, value: Root| *root = value)
    }
}

impl<Root, Field> Clone for Accessor<Root, Field> {
    fn clone(&self) -> Self {
        Self {
            get: Rc::clone(&self.get),
            set: Rc::clone(&self.set),
        }
    }
}

impl<Root, Field> fmt::Debug for Accessor<Root, Field> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Accessor")
            .field("root", &std::any::type_name::<Root>())
            .field("field", &std::any::type_name::<Field>())
            .finish()
    }
}

/// Builds an [`Accessor`] for a path of named fields.
///
/// The field type must be `Clone`.
///
/// # Example
/// ```
/// use scopestore::{field, store::Accessor};
///
/// #[derive(Clone)]
/// struct Window {
///     size: Size,
/// }
///
/// #[derive(Clone)]
/// struct Size {
///     width: u32,
/// }
///
/// let width: Accessor<Window, u32> = field!(Window => size.width);
/// let window = width.with(Window { size: Size { width: 10 } }, 20);
/// assert_eq!(window.size.width, 20);
/// ```
#[macro_export]
macro_rules! field {
    ($root:ty => $($path:ident).+) => {
        $crate::store::Accessor::<$root, _>::new(
            |root: &$root| ::std::clone::Clone::clone(&root.$($path).+),
            |root: &mut $root, value| root.$($path).+ = value,
        )
    };
}
