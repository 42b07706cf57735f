#[macro_use]
mod common;

#[cfg(test)]
mod field {
    tests! {
        get_set in field is OK
        "stored"
    }

    tests! {
        per_instance in field is OK
        "a"
        "b"
    }

    tests! {
        shadows_method in field is OK
        "method"
        "field"
    }

    tests! {
        set_is_expression in field is OK
        "4"
    }

    tests! {
        undefined in field is ERR
        "[line 3:11] Error at 'missing': Undefined property 'missing'"
    }

    tests! {
        set_on_non_instance in field is ERR
        "[line 2:3] Error at 'b': Only instances have fields"
    }

    tests! {
        get_on_non_instance in field is ERR
        "[line 1:12] Error at 'b': Only instances have properties"
    }
}
