//! The `define_plugin!` macro.

/// Builds a [`PluginDescriptor`](crate::plugin::PluginDescriptor) in a const context.
///
/// `desc` and `on_shutdown` are optional and may appear in any order after
/// `name` and `register`.
///
/// ```rust
/// use ember_framework::prelude::*;
///
/// fn register(r: &mut PluginRegistrar) -> Result<(), PluginError> {
///     r.command(CommandDescriptor::new("ping", |_| async { Ok(Some("Pong!".into())) }));
///     Ok(())
/// }
///
/// pub static PING: PluginDescriptor = define_plugin! {
///     name: "ping",
///     register: register,
///     desc: "Answers ping",
/// };
/// assert_eq!(PING.description, "Answers ping");
/// ```
#[macro_export]
macro_rules! define_plugin {
    (name: $name:expr, register: $register:expr $(, $key:ident : $value:expr)* $(,)?) => {
        $crate::__plugin_opt!(
            $crate::plugin::PluginDescriptor::new($name, $register);
            $($key : $value,)*
        )
    };
}

/// Internal helper: applies optional `define_plugin!` keys one at a time.
#[macro_export]
#[doc(hidden)]
macro_rules! __plugin_opt {
    ($desc:expr;) => {
        $desc
    };
    ($desc:expr; desc : $value:expr, $($rest:tt)*) => {
        $crate::__plugin_opt!($desc.with_description($value); $($rest)*)
    };
    ($desc:expr; on_shutdown : $value:expr, $($rest:tt)*) => {
        $crate::__plugin_opt!($desc.with_shutdown($value); $($rest)*)
    };
}

#[cfg(test)]
mod tests {
    use crate::plugin::{PluginDescriptor, PluginRegistrar};
    use crate::PluginError;

    fn register(_: &mut PluginRegistrar) -> Result<(), PluginError> {
        Ok(())
    }

    fn bye() {}

    static PLAIN: PluginDescriptor = define_plugin! { name: "plain", register: register };

    static FULL: PluginDescriptor = define_plugin! {
        name: "full",
        register: register,
        on_shutdown: bye,
        desc: "Everything set",
    };

    #[test]
    fn test_optional_keys() {
        assert_eq!(PLAIN.name, "plain");
        assert_eq!(PLAIN.description, "");
        assert!(PLAIN.on_shutdown.is_none());

        assert_eq!(FULL.description, "Everything set");
        assert!(FULL.on_shutdown.is_some());
    }
}
