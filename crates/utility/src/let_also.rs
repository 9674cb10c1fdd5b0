/// Scope functions for chaining on owned values.
pub trait LetAlso: Sized {
    /// Passes the value into `f` and returns whatever `f` returns.
    fn let_owned<R, F>(self, f: F) -> R
    where
        F: FnOnce(Self) -> R,
    {
        f(self)
    }

    /// Lets `f` mutate the value in place and returns it.
    fn also<F>(mut self, f: F) -> Self
    where
        F: FnOnce(&mut Self),
    {
        f(&mut self);
        self
    }
}

impl<T> LetAlso for T {}
